//! Display formatting for terminal output

pub mod budget;

pub use budget::{format_allocation, format_budget_list, format_budget_tree, format_events};
