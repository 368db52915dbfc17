//! Configuration for budget-core
//!
//! - path resolution (environment override, then XDG / APPDATA)
//! - user settings persisted as `config.json`

pub mod paths;
pub mod settings;

pub use paths::BudgetPaths;
pub use settings::Settings;
