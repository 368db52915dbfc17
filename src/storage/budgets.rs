//! Budget repository for JSON storage
//!
//! Manages loading and saving budgets to `budgets.json`. Soft-deleted
//! budgets stay in the file and are hidden from listings.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::audit::SoftDeletable;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Budget, BudgetId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct BudgetData {
    budgets: Vec<Budget>,
}

/// Repository for budget persistence
pub struct BudgetStore {
    path: PathBuf,
    data: RwLock<HashMap<BudgetId, Budget>>,
}

impl BudgetStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> BudgetResult<RwLockReadGuard<'_, HashMap<BudgetId, Budget>>> {
        self.data
            .read()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> BudgetResult<RwLockWriteGuard<'_, HashMap<BudgetId, Budget>>> {
        self.data
            .write()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Replace the in-memory contents with what is on disk
    pub fn load(&self) -> BudgetResult<()> {
        let file_data: BudgetData = read_json(&self.path)?;
        let mut data = self.write()?;
        data.clear();
        data.extend(file_data.budgets.into_iter().map(|b| (b.id(), b)));
        debug!(count = data.len(), path = %self.path.display(), "Budgets loaded");
        Ok(())
    }

    pub fn save(&self) -> BudgetResult<()> {
        let data = self.read()?;
        let mut budgets: Vec<Budget> = data.values().cloned().collect();
        budgets.sort_by_key(|b| *b.id().as_uuid());
        write_json_atomic(&self.path, &BudgetData { budgets })?;
        debug!(count = data.len(), path = %self.path.display(), "Budgets saved");
        Ok(())
    }

    pub fn get(&self, id: BudgetId) -> BudgetResult<Option<Budget>> {
        Ok(self.read()?.get(&id).cloned())
    }

    /// Budgets that are not soft-deleted, newest period first
    pub fn list(&self) -> BudgetResult<Vec<Budget>> {
        let mut budgets: Vec<Budget> = self
            .read()?
            .values()
            .filter(|b| !b.is_deleted())
            .cloned()
            .collect();
        budgets.sort_by(|a, b| {
            b.period()
                .cmp(&a.period())
                .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
        });
        Ok(budgets)
    }

    /// Insert or update a budget
    pub fn upsert(&self, budget: Budget) -> BudgetResult<()> {
        self.write()?.insert(budget.id(), budget);
        Ok(())
    }

    /// Find a live budget by id (full UUID, or as displayed) or by name
    ///
    /// Name matching is case-insensitive. An ambiguous name is an error.
    pub fn find(&self, identifier: &str) -> BudgetResult<Budget> {
        let identifier = identifier.trim();
        let data = self.read()?;
        let live: Vec<&Budget> = data.values().filter(|b| !b.is_deleted()).collect();

        if let Ok(id) = identifier.parse::<BudgetId>() {
            if let Some(budget) = live.iter().copied().find(|b| b.id() == id) {
                return Ok(budget.clone());
            }
        }
        if let Some(budget) = live.iter().copied().find(|b| b.id().to_string() == identifier) {
            return Ok(budget.clone());
        }

        let lowered = identifier.to_lowercase();
        let mut by_name = live
            .iter()
            .copied()
            .filter(|b| b.name().to_lowercase() == lowered);
        match (by_name.next(), by_name.next()) {
            (Some(budget), None) => Ok(budget.clone()),
            (Some(_), Some(_)) => Err(BudgetError::Storage(format!(
                "Several budgets are named '{}'; use the id instead",
                identifier
            ))),
            (None, _) => Err(BudgetError::budget_not_found(identifier)),
        }
    }

    pub fn count(&self) -> BudgetResult<usize> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditStamp, FixedStampFactory};
    use crate::models::{BudgetPeriod, UserId};
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_store() -> (BudgetStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = BudgetStore::new(temp_dir.path().join("budgets.json"));
        (store, temp_dir)
    }

    fn budget(name: &str, month: u32) -> Budget {
        let period = BudgetPeriod::new(2025, month).unwrap();
        Budget::create(UserId::new(), name, period, "USD").unwrap()
    }

    #[test]
    fn test_empty_store() {
        let (store, _temp) = create_test_store();
        store.load().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let (store, temp) = create_test_store();
        let mut household = budget("Household", 1);
        let food = household.add_category("Food", None).unwrap();
        store.upsert(household.clone()).unwrap();
        store.save().unwrap();

        let reopened = BudgetStore::new(temp.path().join("budgets.json"));
        reopened.load().unwrap();
        let loaded = reopened.get(household.id()).unwrap().unwrap();
        assert_eq!(loaded.name(), "Household");
        assert!(loaded.find_category(food).is_some());
        assert!(loaded.domain_events().is_empty());
    }

    #[test]
    fn test_list_orders_newest_first_and_hides_deleted() {
        let (store, _temp) = create_test_store();
        let january = budget("January", 1);
        let march = budget("March", 3);
        let mut gone = budget("Gone", 2);
        gone.soft_delete(&FixedStampFactory::new(AuditStamp::new(UserId::new(), Utc::now())));
        for b in [january, march, gone] {
            store.upsert(b).unwrap();
        }

        let names: Vec<String> = store.list().unwrap().iter().map(|b| b.name().to_string()).collect();
        assert_eq!(names, vec!["March", "January"]);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_find_by_id_display_and_name() {
        let (store, _temp) = create_test_store();
        let household = budget("Household", 1);
        let id = household.id();
        store.upsert(household).unwrap();

        assert_eq!(store.find(&id.as_uuid().to_string()).unwrap().id(), id);
        assert_eq!(store.find(&id.to_string()).unwrap().id(), id);
        assert_eq!(store.find("  HOUSEHOLD ").unwrap().id(), id);
        assert!(store.find("Holiday").unwrap_err().is_not_found());
    }

    #[test]
    fn test_find_ambiguous_name() {
        let (store, _temp) = create_test_store();
        store.upsert(budget("Home", 1)).unwrap();
        store.upsert(budget("Home", 2)).unwrap();

        assert!(matches!(store.find("home").unwrap_err(), BudgetError::Storage(_)));
    }
}
