//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod audit;
pub mod budget;
pub mod category;
pub mod money;

pub use audit::{handle_audit_command, AuditArgs};
pub use budget::{handle_budget_command, BudgetCommands, ExportFormat};
pub use category::{handle_category_command, CategoryCommands};
pub use money::{handle_allocate_command, AllocateArgs};

use crate::config::settings::Settings;
use crate::error::{BudgetError, BudgetResult};
use crate::services::BudgetService;
use crate::storage::Storage;

/// A budget service acting as the configured user
fn budget_service<'a>(storage: &'a Storage, settings: &Settings) -> BudgetResult<BudgetService<'a>> {
    let actor_id = settings.actor_id.ok_or_else(|| {
        BudgetError::Config("no actor id configured; run 'budget init' first".into())
    })?;
    Ok(BudgetService::new(storage, actor_id).with_journal(settings.audit_journal_enabled))
}
