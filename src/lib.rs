//! budget-core - monthly household budgets
//!
//! This library provides the domain core behind the `budget` binary: a
//! budget aggregate owning a two-level category tree, currency-safe money,
//! and audit stamping with soft-delete cascading applied when a unit of work
//! is saved.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `models`: Budget aggregate, categories, money, periods and domain events
//! - `audit`: Audit stamps, the cascade walker and the audit journal
//! - `storage`: JSON file storage and the save-cycle session
//! - `services`: Load, change, audit and persist as one operation
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use budget_core::config::{paths::BudgetPaths, settings::Settings};
//! use budget_core::services::BudgetService;
//! use budget_core::storage::Storage;
//!
//! let paths = BudgetPaths::new()?;
//! let mut settings = Settings::load_or_create(&paths)?;
//! let (actor, _) = settings.ensure_actor_id();
//! let storage = Storage::new(paths)?;
//! storage.load_all()?;
//! let service = BudgetService::new(&storage, actor);
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{BudgetError, BudgetResult};
