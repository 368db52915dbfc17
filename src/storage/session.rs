//! In-memory unit of work over budget aggregates
//!
//! A [`BudgetSession`] tracks the budgets handed to it, remembers what each
//! budget and category looked like when tracking began (as a JSON snapshot),
//! and derives each entity's [`EntityState`] by comparing against that
//! snapshot. [`BudgetSession::save_changes`] runs the audit walker over the
//! session and then takes fresh snapshots, the same way a commit would.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::audit::{
    generate_diff, AuditCascadeWalker, AuditStamp, AuditStampFactory, EntityKey, EntityState,
    Navigation, NavigationKind, Operation, SaveCycleReport, SoftDeletable, TrackedEntity,
    TrackedEntry, UnitOfWork,
};
use crate::error::{BudgetError, BudgetResult};
use crate::models::budget::BUDGET_KIND;
use crate::models::category::CATEGORY_KIND;
use crate::models::{Budget, BudgetCategoryId, BudgetId, CategoryNode, DomainEvent};

/// Snapshot of one entity: scalar fields plus its soft-delete flag
#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    value: Value,
    is_deleted: bool,
}

/// Snapshots of a budget and, when loaded, its categories
#[derive(Debug, Clone, Default)]
struct Baseline {
    budget: Option<Snapshot>,
    categories: HashMap<BudgetCategoryId, Snapshot>,
}

#[derive(Debug)]
struct Tracked {
    budget: Budget,
    added: bool,
    categories_loaded: bool,
    baseline: Baseline,
}

/// Serialize `entity` without its nested collection and audit metadata
///
/// The soft-delete block is flattened to a single `is_deleted` field so that
/// diffs read naturally.
fn snapshot<T: Serialize + SoftDeletable>(entity: &T, nested: &str) -> BudgetResult<Snapshot> {
    let mut value = serde_json::to_value(entity)?;
    if let Value::Object(map) = &mut value {
        map.remove(nested);
        map.remove("audit");
        map.remove("deletion");
        map.insert("is_deleted".into(), Value::Bool(entity.is_deleted()));
    }
    Ok(Snapshot {
        value,
        is_deleted: entity.is_deleted(),
    })
}

fn budget_snapshot(budget: &Budget) -> BudgetResult<Snapshot> {
    snapshot(budget, "categories")
}

fn category_snapshot(category: &CategoryNode) -> BudgetResult<Snapshot> {
    snapshot(category, "children")
}

fn category_key(category: &CategoryNode) -> EntityKey {
    category.entity_key()
}

impl Tracked {
    fn new(budget: Budget, added: bool, categories_loaded: bool) -> BudgetResult<Self> {
        let mut tracked = Self {
            budget,
            added,
            categories_loaded,
            baseline: Baseline::default(),
        };
        tracked.rebaseline()?;
        Ok(tracked)
    }

    fn rebaseline(&mut self) -> BudgetResult<()> {
        let mut baseline = Baseline {
            budget: Some(budget_snapshot(&self.budget)?),
            categories: HashMap::new(),
        };
        if self.categories_loaded {
            for category in self.budget.get_all_categories() {
                baseline
                    .categories
                    .insert(category.id(), category_snapshot(category)?);
            }
        }
        self.baseline = baseline;
        self.added = false;
        Ok(())
    }

    fn state_of(
        &self,
        original: Option<&Snapshot>,
        current: BudgetResult<Snapshot>,
        marked: bool,
    ) -> EntityState {
        if self.added {
            return EntityState::Added;
        }
        match (original, current) {
            (None, _) => EntityState::Added,
            (Some(_), _) if marked => EntityState::Modified,
            (Some(before), Ok(after)) if *before == after => EntityState::Unchanged,
            _ => EntityState::Modified,
        }
    }

    fn entries(&self, marked: &HashSet<EntityKey>) -> Vec<TrackedEntry> {
        let budget_key = self.budget.entity_key();
        let categories_nav = if self.categories_loaded {
            Navigation::collection(
                "categories",
                self.budget.categories().iter().map(category_key).collect(),
            )
        } else {
            Navigation::unloaded("categories", NavigationKind::Collection)
        };

        let mut entries = vec![TrackedEntry {
            key: budget_key,
            state: self.state_of(
                self.baseline.budget.as_ref(),
                budget_snapshot(&self.budget),
                marked.contains(&budget_key),
            ),
            was_deleted: self.was_deleted(self.baseline.budget.as_ref()),
            navigations: vec![categories_nav],
        }];

        if !self.categories_loaded {
            return entries;
        }

        let mut present = HashSet::new();
        for category in self.budget.get_all_categories() {
            let key = category_key(category);
            present.insert(category.id());
            let original = self.baseline.categories.get(&category.id());
            let navigations = if category.is_root() {
                vec![Navigation::collection(
                    "children",
                    category.children().iter().map(category_key).collect(),
                )]
            } else {
                Vec::new()
            };
            entries.push(TrackedEntry {
                key,
                state: self.state_of(original, category_snapshot(category), marked.contains(&key)),
                was_deleted: self.was_deleted(original),
                navigations,
            });
        }

        let mut removed: Vec<(&BudgetCategoryId, &Snapshot)> = self
            .baseline
            .categories
            .iter()
            .filter(|(id, _)| !present.contains(*id))
            .collect();
        removed.sort_by_key(|(id, _)| *id.as_uuid());
        entries.extend(removed.into_iter().map(|(id, original)| TrackedEntry {
            key: EntityKey::new(CATEGORY_KIND, *id.as_uuid()),
            state: EntityState::Deleted,
            was_deleted: original.is_deleted,
            navigations: Vec::new(),
        }));
        entries
    }

    /// New entities start out not deleted
    fn was_deleted(&self, original: Option<&Snapshot>) -> bool {
        !self.added && original.is_some_and(|s| s.is_deleted)
    }

    /// Describe what changed in an entity since the baseline
    fn changes_for(&self, key: &EntityKey) -> Option<String> {
        let (before, after) = if key.kind == BUDGET_KIND {
            if key.id != *self.budget.id().as_uuid() {
                return None;
            }
            (self.baseline.budget.as_ref()?, budget_snapshot(&self.budget).ok()?)
        } else {
            let id = BudgetCategoryId::from_uuid(key.id);
            let category = self.budget.find_category(id)?;
            (self.baseline.categories.get(&id)?, category_snapshot(category).ok()?)
        };
        generate_diff(&before.value, &after.value)
    }

    fn entity_mut(&mut self, key: &EntityKey) -> Option<&mut dyn TrackedEntity> {
        if key.kind == BUDGET_KIND && key.id == *self.budget.id().as_uuid() {
            return Some(&mut self.budget);
        }
        if key.kind == CATEGORY_KIND && self.categories_loaded {
            return self
                .budget
                .category_mut(BudgetCategoryId::from_uuid(key.id))
                .map(|c| c as &mut dyn TrackedEntity);
        }
        None
    }
}

/// Unit of work over a set of budgets
#[derive(Debug, Default)]
pub struct BudgetSession {
    tracked: Vec<Tracked>,
    marked: HashSet<EntityKey>,
    walker: AuditCascadeWalker,
}

impl BudgetSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a budget that is not in storage yet
    ///
    /// The budget and all of its categories are reported as `Added`.
    pub fn track_new(&mut self, budget: Budget) -> BudgetResult<BudgetId> {
        self.track(budget, true, true)
    }

    /// Track a stored budget with its categories loaded
    pub fn attach(&mut self, budget: Budget) -> BudgetResult<BudgetId> {
        self.track(budget, false, true)
    }

    /// Track a stored budget without its categories
    ///
    /// Only the budget itself is reported, and its `categories` navigation
    /// is reported as not loaded, so deleting the budget does not cascade.
    pub fn attach_without_categories(&mut self, budget: Budget) -> BudgetResult<BudgetId> {
        self.track(budget, false, false)
    }

    fn track(&mut self, budget: Budget, added: bool, categories_loaded: bool) -> BudgetResult<BudgetId> {
        let id = budget.id();
        if self.position(id).is_some() {
            return Err(BudgetError::Storage(format!(
                "Budget {} is already tracked by this session",
                id
            )));
        }
        debug!(budget = %id, added, categories_loaded, "Tracking budget");
        self.tracked.push(Tracked::new(budget, added, categories_loaded)?);
        Ok(id)
    }

    fn position(&self, id: BudgetId) -> Option<usize> {
        self.tracked.iter().position(|t| t.budget.id() == id)
    }

    fn tracked_mut(&mut self, id: BudgetId) -> BudgetResult<&mut Tracked> {
        self.tracked
            .iter_mut()
            .find(|t| t.budget.id() == id)
            .ok_or_else(|| BudgetError::budget_not_found(id.to_string()))
    }

    pub fn budget(&self, id: BudgetId) -> Option<&Budget> {
        self.tracked
            .iter()
            .map(|t| &t.budget)
            .find(|b| b.id() == id)
    }

    pub fn budget_mut(&mut self, id: BudgetId) -> Option<&mut Budget> {
        self.tracked
            .iter_mut()
            .map(|t| &mut t.budget)
            .find(|b| b.id() == id)
    }

    pub fn budgets(&self) -> impl Iterator<Item = &Budget> {
        self.tracked.iter().map(|t| &t.budget)
    }

    pub fn into_budgets(self) -> Vec<Budget> {
        self.tracked.into_iter().map(|t| t.budget).collect()
    }

    /// Anything tracked differs from its baseline
    pub fn has_changes(&self) -> bool {
        self.entries()
            .iter()
            .any(|e| e.state != EntityState::Unchanged)
    }

    /// Flag a tracked budget as deleted
    pub fn soft_delete_budget(
        &mut self,
        id: BudgetId,
        factory: &dyn AuditStampFactory,
    ) -> BudgetResult<AuditStamp> {
        let tracked = self.tracked_mut(id)?;
        if tracked.budget.is_deleted() {
            return Err(BudgetError::InvalidBudgetData(format!(
                "budget {} is already deleted",
                id
            )));
        }
        debug!(budget = %id, "Budget soft-deleted");
        Ok(tracked.budget.soft_delete(factory))
    }

    /// Flag a category as deleted, leaving it in the tree
    pub fn soft_delete_category(
        &mut self,
        budget_id: BudgetId,
        category_id: BudgetCategoryId,
        factory: &dyn AuditStampFactory,
    ) -> BudgetResult<AuditStamp> {
        let tracked = self.tracked_mut(budget_id)?;
        if !tracked.categories_loaded {
            return Err(BudgetError::Storage(format!(
                "Categories of budget {} are not loaded",
                budget_id
            )));
        }
        let category = tracked
            .budget
            .category_mut(category_id)
            .ok_or(BudgetError::CategoryNotFound(category_id))?;
        if category.is_deleted() {
            return Err(BudgetError::InvalidBudgetData(format!(
                "category {} is already deleted",
                category_id
            )));
        }
        debug!(budget = %budget_id, category = %category_id, "Category soft-deleted");
        Ok(category.soft_delete(factory))
    }

    /// Run the audit walker, then treat the current state as committed
    pub fn save_changes(&mut self, factory: &dyn AuditStampFactory) -> BudgetResult<SaveCycleReport> {
        let walker = self.walker;
        let mut report = walker.before_save(self, factory);

        for entry in report.stamped.iter_mut().chain(report.cascaded.iter_mut()) {
            if entry.operation == Operation::Create {
                continue;
            }
            entry.changes = self.tracked.iter().find_map(|t| t.changes_for(&entry.key));
        }

        for tracked in &mut self.tracked {
            tracked.rebaseline()?;
        }
        self.marked.clear();

        if report.is_empty() {
            debug!("Save cycle found nothing to audit");
        }
        Ok(report)
    }

    /// Drain pending events from every tracked budget
    pub fn take_domain_events(&mut self) -> Vec<DomainEvent> {
        self.tracked
            .iter_mut()
            .flat_map(|t| t.budget.take_domain_events())
            .collect()
    }
}

impl UnitOfWork for BudgetSession {
    fn entries(&self) -> Vec<TrackedEntry> {
        self.tracked
            .iter()
            .flat_map(|t| t.entries(&self.marked))
            .collect()
    }

    fn entity_mut(&mut self, key: &EntityKey) -> Option<&mut dyn TrackedEntity> {
        self.tracked
            .iter_mut()
            .find_map(|t| t.entity_mut(key))
    }

    fn mark_modified(&mut self, key: &EntityKey) {
        if !self.marked.insert(*key) {
            warn!(entity = %key, "Entity marked modified twice in one save cycle");
        }
    }
}
