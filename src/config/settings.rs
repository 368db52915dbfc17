//! User settings for budget-core
//!
//! Stored as JSON in `config.json`. Missing fields take their defaults, so
//! older files keep loading as fields are added.

use serde::{Deserialize, Serialize};

use super::paths::BudgetPaths;
use crate::error::{BudgetError, BudgetResult};
use crate::models::UserId;
use crate::storage::file_io::write_json_atomic;

/// Newest settings schema this build understands
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency for new budgets when none is given
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// The local user; generated on first save when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<UserId>,

    /// Append every save cycle to the audit journal
    #[serde(default = "default_true")]
    pub audit_journal_enabled: bool,

    /// `tracing` filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_currency: default_currency(),
            actor_id: None,
            audit_journal_enabled: true,
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or defaults if the file doesn't exist
    ///
    /// Defaults are not written back; callers decide when to persist.
    pub fn load_or_create(paths: &BudgetPaths) -> BudgetResult<Self> {
        let settings_path = paths.settings_file();
        if !settings_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| BudgetError::Io(format!("Failed to read settings file: {}", e)))?;
        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| BudgetError::Config(format!("Failed to parse settings file: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, paths: &BudgetPaths) -> BudgetResult<()> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    pub fn validate(&self) -> BudgetResult<()> {
        if self.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(BudgetError::Config(format!(
                "settings schema version {} is newer than supported version {}",
                self.schema_version, CURRENT_SCHEMA_VERSION
            )));
        }
        let currency = self.default_currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(BudgetError::Config(format!(
                "default_currency must be a 3-letter code, got '{}'",
                self.default_currency
            )));
        }
        Ok(())
    }

    /// The configured actor, generating one if none is set yet
    ///
    /// Returns whether a new id was generated so the caller can persist it.
    pub fn ensure_actor_id(&mut self) -> (UserId, bool) {
        match self.actor_id {
            Some(id) => (id, false),
            None => {
                let id = UserId::new();
                self.actor_id = Some(id);
                (id, true)
            }
        }
    }
}
