//! Audit journal command

use clap::Args;

use crate::error::BudgetResult;
use crate::storage::Storage;

#[derive(Args)]
pub struct AuditArgs {
    /// Number of most recent entries to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

/// Print the most recent audit journal entries, oldest first
pub fn handle_audit_command(storage: &Storage, args: AuditArgs) -> BudgetResult<()> {
    let records = storage.journal.read_recent(args.limit)?;
    if records.is_empty() {
        println!("No audit entries found.");
        return Ok(());
    }

    for record in &records {
        println!("{}", record.format_human_readable());
    }
    Ok(())
}
