//! Budget CLI commands
//!
//! Implements the budget-level commands: create, list, show, export,
//! activate, rename and delete.

use clap::{Subcommand, ValueEnum};

use crate::config::settings::Settings;
use crate::display::{format_budget_list, format_budget_tree, format_events};
use crate::error::{BudgetError, BudgetResult};
use crate::models::BudgetPeriod;
use crate::storage::Storage;

use super::budget_service;

/// Export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Yaml,
}

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Create a new draft budget
    Create {
        /// Budget name
        name: String,
        /// Budget period as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        period: Option<String>,
        /// Currency code (defaults to the configured currency)
        #[arg(short, long)]
        currency: Option<String>,
    },

    /// List budgets, newest period first
    #[command(alias = "ls")]
    List,

    /// Show a budget with its category tree
    Show {
        /// Budget name or ID
        budget: String,
    },

    /// Print a budget as JSON or YAML
    Export {
        /// Budget name or ID
        budget: String,
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,
    },

    /// Activate a draft budget
    Activate {
        /// Budget name or ID
        budget: String,
    },

    /// Rename a budget
    Rename {
        /// Budget name or ID
        budget: String,
        /// New name
        name: String,
    },

    /// Delete a budget and its top-level categories
    Delete {
        /// Budget name or ID
        budget: String,
    },
}

/// Handle a budget command
pub fn handle_budget_command(
    storage: &Storage,
    settings: &Settings,
    cmd: BudgetCommands,
) -> BudgetResult<()> {
    let service = budget_service(storage, settings)?;

    match cmd {
        BudgetCommands::Create {
            name,
            period,
            currency,
        } => {
            let period = match period {
                Some(p) => BudgetPeriod::parse(&p)?,
                None => BudgetPeriod::current_month()?,
            };
            let currency = currency.unwrap_or_else(|| settings.default_currency.clone());
            let committed = service.create(&name, period, &currency)?;

            println!("Created budget: {}", committed.budget.name());
            println!("  Period:   {}", committed.budget.period());
            println!("  Currency: {}", committed.budget.currency());
            println!("  ID:       {}", committed.budget.id());
        }

        BudgetCommands::List => {
            let budgets = service.list()?;
            print!("{}", format_budget_list(&budgets)?);
        }

        BudgetCommands::Show { budget } => {
            let budget = service.find(&budget)?;
            print!("{}", format_budget_tree(&budget)?);
        }

        BudgetCommands::Export { budget, format } => {
            let budget = service.find(&budget)?;
            let output = match format {
                ExportFormat::Json => serde_json::to_string_pretty(&budget)
                    .map_err(|e| BudgetError::Json(e.to_string()))?,
                ExportFormat::Yaml => serde_yaml::to_string(&budget)
                    .map_err(|e| BudgetError::Json(format!("YAML export failed: {}", e)))?,
            };
            println!("{}", output.trim_end());
        }

        BudgetCommands::Activate { budget } => {
            let committed = service.update(&budget, |b| b.activate())?;
            print!("{}", format_events(&committed.events));
            println!(
                "Budget '{}' is now {}",
                committed.budget.name(),
                committed.budget.status()
            );
        }

        BudgetCommands::Rename { budget, name } => {
            let committed = service.update(&budget, |b| {
                let old = b.name().to_string();
                b.update_name(&name)?;
                Ok(old)
            })?;
            println!(
                "Renamed budget '{}' to '{}'",
                committed.value,
                committed.budget.name()
            );
        }

        BudgetCommands::Delete { budget } => {
            let committed = service.delete(&budget)?;
            println!(
                "Deleted budget '{}' ({} categories cascaded)",
                committed.budget.name(),
                committed.report.cascaded.len()
            );
        }
    }

    Ok(())
}
