//! Budget service
//!
//! Runs each change to a budget as one save cycle: load from the store,
//! track in a [`BudgetSession`], apply the change through the aggregate,
//! audit and persist, append the journal, then hand back the drained events.

use tracing::info;

use crate::audit::{SaveCycleReport, SystemStampFactory};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Budget, BudgetCategoryId, BudgetId, BudgetPeriod, DomainEvent, UserId};
use crate::storage::{BudgetSession, Storage};

/// The result of a committed save cycle
#[derive(Debug)]
pub struct Committed<T> {
    /// Whatever the change itself returned
    pub value: T,
    /// The budget as persisted
    pub budget: Budget,
    pub report: SaveCycleReport,
    /// Events raised during the change, oldest first
    pub events: Vec<DomainEvent>,
}

/// Service for budget management
pub struct BudgetService<'a> {
    storage: &'a Storage,
    actor_id: UserId,
    journal_enabled: bool,
}

impl<'a> BudgetService<'a> {
    pub fn new(storage: &'a Storage, actor_id: UserId) -> Self {
        Self {
            storage,
            actor_id,
            journal_enabled: true,
        }
    }

    /// Turn audit journaling on or off
    pub fn with_journal(mut self, enabled: bool) -> Self {
        self.journal_enabled = enabled;
        self
    }

    /// Create and persist a new draft budget
    pub fn create(
        &self,
        name: &str,
        period: BudgetPeriod,
        currency: &str,
    ) -> BudgetResult<Committed<()>> {
        let budget = Budget::create(self.actor_id, name, period, currency)?;
        let mut session = BudgetSession::new();
        let id = session.track_new(budget)?;
        self.commit(session, id, ())
    }

    /// Live budgets, newest period first
    pub fn list(&self) -> BudgetResult<Vec<Budget>> {
        self.storage.budgets.list()
    }

    /// Find a live budget by id or name
    pub fn find(&self, identifier: &str) -> BudgetResult<Budget> {
        self.storage.budgets.find(identifier)
    }

    /// Apply `change` to a stored budget as one save cycle
    ///
    /// Nothing is persisted when `change` fails.
    pub fn update<T, F>(&self, identifier: &str, change: F) -> BudgetResult<Committed<T>>
    where
        F: FnOnce(&mut Budget) -> BudgetResult<T>,
    {
        let budget = self.find(identifier)?;
        let mut session = BudgetSession::new();
        let id = session.attach(budget)?;
        let budget = session
            .budget_mut(id)
            .ok_or_else(|| BudgetError::budget_not_found(id.to_string()))?;
        let value = change(budget)?;
        self.commit(session, id, value)
    }

    /// Soft-delete a budget along with its root categories
    pub fn delete(&self, identifier: &str) -> BudgetResult<Committed<()>> {
        let budget = self.find(identifier)?;
        let mut session = BudgetSession::new();
        let id = session.attach(budget)?;
        let factory = self.stamp_factory();
        session.soft_delete_budget(id, &factory)?;
        self.commit_with(session, id, (), &factory)
    }

    fn stamp_factory(&self) -> SystemStampFactory {
        SystemStampFactory::new(self.actor_id)
    }

    fn commit<T>(&self, session: BudgetSession, id: BudgetId, value: T) -> BudgetResult<Committed<T>> {
        let factory = self.stamp_factory();
        self.commit_with(session, id, value, &factory)
    }

    fn commit_with<T>(
        &self,
        mut session: BudgetSession,
        id: BudgetId,
        value: T,
        factory: &SystemStampFactory,
    ) -> BudgetResult<Committed<T>> {
        let report = session.save_changes(factory)?;
        let events = session.take_domain_events();

        let budget = session
            .budget(id)
            .cloned()
            .ok_or_else(|| BudgetError::budget_not_found(id.to_string()))?;
        for tracked in session.into_budgets() {
            self.storage.budgets.upsert(tracked)?;
        }
        self.storage.budgets.save()?;

        if self.journal_enabled {
            self.storage.journal.record(&report)?;
        }
        info!(
            budget = %id,
            correlation = factory.correlation_id(),
            stamped = report.stamped.len(),
            cascaded = report.cascaded.len(),
            events = events.len(),
            "Budget saved"
        );

        Ok(Committed {
            value,
            budget,
            report,
            events,
        })
    }
}

/// Resolve a category by id (full UUID or as displayed) or by name
pub fn resolve_category(budget: &Budget, identifier: &str) -> BudgetResult<BudgetCategoryId> {
    let identifier = identifier.trim();
    if let Ok(id) = identifier.parse::<BudgetCategoryId>() {
        if budget.find_category(id).is_some() {
            return Ok(id);
        }
    }
    budget
        .get_all_categories()
        .into_iter()
        .find(|c| c.id().to_string() == identifier)
        .or_else(|| budget.find_category_by_name(identifier))
        .map(|c| c.id())
        .ok_or_else(|| BudgetError::UnknownCategory(identifier.to_string()))
}
