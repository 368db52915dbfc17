//! First-run setup

use tracing::info;

use crate::config::paths::BudgetPaths;
use crate::config::settings::Settings;
use crate::error::BudgetResult;

use super::file_io::write_json_atomic;

/// Create the directory layout, settings file and an empty budget file
///
/// Existing files are left as they are. Returns the settings in effect.
pub fn initialize_storage(paths: &BudgetPaths) -> BudgetResult<Settings> {
    paths.ensure_directories()?;

    let mut settings = Settings::load_or_create(paths)?;
    let (actor_id, generated) = settings.ensure_actor_id();
    if generated || !paths.settings_file().exists() {
        settings.save(paths)?;
        info!(actor = %actor_id, path = %paths.settings_file().display(), "Settings written");
    }

    if !paths.budgets_file().exists() {
        write_json_atomic(paths.budgets_file(), &serde_json::json!({ "budgets": [] }))?;
    }

    Ok(settings)
}
