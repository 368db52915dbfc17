use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use budget_core::cli::{
    handle_allocate_command, handle_audit_command, handle_budget_command, handle_category_command,
    AllocateArgs, AuditArgs, BudgetCommands, CategoryCommands,
};
use budget_core::config::{paths::BudgetPaths, settings::Settings};
use budget_core::storage::Storage;

#[derive(Parser)]
#[command(
    name = "budget",
    author = "Kaylee Beyene",
    version,
    about = "Monthly household budgets from the command line",
    long_about = "budget keeps monthly household budgets: a two-level tree of \
                  categories with planned amounts in one currency, a draft/active \
                  lifecycle, and an audit journal of every change."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,

    #[command(flatten)]
    Budget(BudgetCommands),

    /// Category management commands
    #[command(subcommand, alias = "cat")]
    Category(CategoryCommands),

    /// Split an amount into shares without losing a cent
    Allocate(AllocateArgs),

    /// Show the audit journal
    Audit(AuditArgs),
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = BudgetPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;
    init_logging(&settings);
    debug!(base_dir = %paths.base_dir().display(), "Paths resolved");

    let command = match cli.command {
        Some(Commands::Allocate(args)) => {
            handle_allocate_command(args)?;
            return Ok(());
        }
        Some(Commands::Init) => {
            println!("Initializing budget at: {}", paths.base_dir().display());
            let settings = budget_core::storage::init::initialize_storage(&paths)?;
            println!("Initialization complete!");
            if let Some(actor) = settings.actor_id {
                println!("  Actor ID: {}", actor);
            }
            println!();
            println!("Run 'budget create <name>' to start a budget.");
            return Ok(());
        }
        Some(Commands::Config) => {
            println!("budget configuration");
            println!("====================");
            println!("Base directory:  {}", paths.base_dir().display());
            println!("Settings file:   {}", paths.settings_file().display());
            println!("Budgets file:    {}", paths.budgets_file().display());
            println!("Audit journal:   {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Default currency: {}", settings.default_currency);
            println!("  Audit journal:    {}", settings.audit_journal_enabled);
            println!("  Log filter:       {}", settings.log_filter);
            match settings.actor_id {
                Some(actor) => println!("  Actor ID:         {}", actor),
                None => println!("  Actor ID:         (not set, run 'budget init')"),
            }
            return Ok(());
        }
        Some(command) => command,
        None => {
            println!("budget - monthly household budgets");
            println!();
            println!("Run 'budget --help' for usage information.");
            return Ok(());
        }
    };

    // Initialize storage
    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    let (actor_id, generated) = settings.ensure_actor_id();
    if generated {
        settings.save(&paths)?;
        debug!(actor = %actor_id, "Generated actor id");
    }

    match command {
        Commands::Budget(cmd) => handle_budget_command(&storage, &settings, cmd)?,
        Commands::Category(cmd) => handle_category_command(&storage, &settings, cmd)?,
        Commands::Audit(args) => handle_audit_command(&storage, args)?,
        Commands::Allocate(_) | Commands::Init | Commands::Config => {}
    }

    Ok(())
}
