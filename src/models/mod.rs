//! Core data models for budget-core
//!
//! This module contains the budgeting domain: money, periods, the category
//! tree and the budget aggregate that owns it.

pub mod budget;
pub mod category;
pub mod events;
pub mod ids;
pub mod money;
pub mod period;

pub use budget::{Budget, BudgetStatus, CategoryTotal};
pub use category::CategoryNode;
pub use events::DomainEvent;
pub use ids::{BudgetCategoryId, BudgetId, UserId};
pub use money::Money;
pub use period::BudgetPeriod;
