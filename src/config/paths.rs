//! Path management for budget-core
//!
//! ## Path Resolution Order
//!
//! 1. `BUDGET_CORE_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/budget-core` or `~/.config/budget-core`
//! 3. Windows: `%APPDATA%\budget-core`

use std::path::{Path, PathBuf};

use crate::error::{BudgetError, BudgetResult};

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "BUDGET_CORE_DATA_DIR";

const APP_DIR: &str = "budget-core";

/// Every file location the application reads or writes
#[derive(Debug, Clone)]
pub struct BudgetPaths {
    base_dir: PathBuf,
}

impl BudgetPaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns a config error if neither the override nor a home/app-data
    /// directory can be found.
    pub fn new() -> BudgetResult<Self> {
        let base_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };
        Ok(Self { base_dir })
    }

    /// Use an explicit base directory
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `<base>/data`
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// `<base>/data/budgets.json`
    pub fn budgets_file(&self) -> PathBuf {
        self.data_dir().join("budgets.json")
    }

    pub fn ensure_directories(&self) -> BudgetResult<()> {
        std::fs::create_dir_all(self.data_dir()).map_err(|e| {
            BudgetError::Io(format!(
                "Failed to create data directory {}: {}",
                self.data_dir().display(),
                e
            ))
        })
    }

    /// `init` has been run (the settings file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> BudgetResult<PathBuf> {
    let config_base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => {
            let home = std::env::var_os("HOME").ok_or_else(|| {
                BudgetError::Config("HOME environment variable not set".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join(APP_DIR))
}

#[cfg(windows)]
fn resolve_default_path() -> BudgetResult<PathBuf> {
    let appdata = std::env::var_os("APPDATA")
        .ok_or_else(|| BudgetError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join(APP_DIR))
}
