//! Storage layer for budget-core
//!
//! JSON file storage with atomic writes, the in-memory unit of work that
//! feeds the audit walker, and the audit journal location.

pub mod budgets;
pub mod file_io;
pub mod init;
pub mod session;

pub use budgets::BudgetStore;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use session::BudgetSession;

use crate::audit::AuditJournal;
use crate::config::paths::BudgetPaths;
use crate::error::BudgetResult;

/// Access to every persisted resource
pub struct Storage {
    paths: BudgetPaths,
    pub budgets: BudgetStore,
    pub journal: AuditJournal,
}

impl Storage {
    pub fn new(paths: BudgetPaths) -> BudgetResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            budgets: BudgetStore::new(paths.budgets_file()),
            journal: AuditJournal::new(paths.audit_log()),
            paths,
        })
    }

    pub fn paths(&self) -> &BudgetPaths {
        &self.paths
    }

    pub fn load_all(&self) -> BudgetResult<()> {
        self.budgets.load()
    }

    pub fn save_all(&self) -> BudgetResult<()> {
        self.budgets.save()
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}
