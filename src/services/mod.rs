//! Service layer for budget-core
//!
//! Services sit between the command handlers and storage. Each mutating
//! call is one audited save cycle.

pub mod budget;

pub use budget::{resolve_category, BudgetService, Committed};
