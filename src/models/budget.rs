//! The budget aggregate
//!
//! A [`Budget`] is the single entry point for every change to itself and its
//! category tree. Each mutator validates the whole aggregate's rules, applies
//! the change and appends a [`DomainEvent`] to the pending outbox; nothing is
//! dispatched from here.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::category::{validated_name, CategoryNode};
use super::events::DomainEvent;
use super::ids::{BudgetCategoryId, BudgetId, UserId};
use super::money::Money;
use super::period::BudgetPeriod;
use crate::audit::{
    AuditFields, Auditable, EntityKey, SoftDeletable, SoftDeleteFields, TrackedEntity,
};
use crate::error::{BudgetError, BudgetResult};

/// Entity kind reported to the unit of work
pub const BUDGET_KIND: &str = "Budget";

/// Budget lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BudgetStatus {
    /// Being planned; categories and amounts are still being set up
    #[default]
    Draft,
    /// In use for the period. There is no way back to draft.
    Active,
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "Draft"),
            Self::Active => write!(f, "Active"),
        }
    }
}

/// Total planned for one root category, subcategories included
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category_id: BudgetCategoryId,
    pub name: String,
    pub total: Money,
}

/// Where a category sits in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Root(usize),
    Child(usize, usize),
}

/// A monthly budget and its category tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBudget")]
pub struct Budget {
    id: BudgetId,
    owner_id: UserId,
    name: String,
    period: BudgetPeriod,
    currency: String,
    #[serde(default)]
    status: BudgetStatus,
    #[serde(default)]
    categories: Vec<CategoryNode>,
    #[serde(default)]
    audit: AuditFields,
    #[serde(default)]
    deletion: SoftDeleteFields,
    #[serde(skip)]
    pending_events: Vec<DomainEvent>,
}

/// Stored form, checked before it becomes a [`Budget`]
#[derive(Deserialize)]
struct RawBudget {
    id: BudgetId,
    owner_id: UserId,
    name: String,
    period: BudgetPeriod,
    currency: String,
    #[serde(default)]
    status: BudgetStatus,
    #[serde(default)]
    categories: Vec<CategoryNode>,
    #[serde(default)]
    audit: AuditFields,
    #[serde(default)]
    deletion: SoftDeleteFields,
}

impl TryFrom<RawBudget> for Budget {
    type Error = BudgetError;

    fn try_from(raw: RawBudget) -> Result<Self, Self::Error> {
        let name = validated_name(&raw.name, "Budget")?;
        let currency = validated_currency(&raw.currency)?;
        for category in &raw.categories {
            category.validate_loaded(None, &currency)?;
        }

        Ok(Self {
            id: raw.id,
            owner_id: raw.owner_id,
            name,
            period: raw.period,
            currency,
            status: raw.status,
            categories: raw.categories,
            audit: raw.audit,
            deletion: raw.deletion,
            pending_events: Vec::new(),
        })
    }
}

fn validated_currency(currency: &str) -> BudgetResult<String> {
    let code = currency.trim().to_uppercase();
    if code.is_empty() {
        return Err(BudgetError::InvalidBudgetData(
            "currency cannot be empty".into(),
        ));
    }
    if code.chars().count() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(BudgetError::InvalidBudgetData(format!(
            "currency must be a 3-letter code, got '{}'",
            code
        )));
    }
    Ok(code)
}

impl Budget {
    /// Create a draft budget
    ///
    /// # Example
    ///
    /// ```
    /// use budget_core::models::{Budget, BudgetPeriod, BudgetStatus, UserId};
    ///
    /// let period = BudgetPeriod::new(2025, 3).unwrap();
    /// let budget = Budget::create(UserId::new(), "Household", period, " zar ").unwrap();
    /// assert_eq!(budget.currency(), "ZAR");
    /// assert_eq!(budget.status(), BudgetStatus::Draft);
    /// assert_eq!(budget.domain_events().len(), 1);
    /// ```
    pub fn create(
        owner_id: UserId,
        name: &str,
        period: BudgetPeriod,
        currency: &str,
    ) -> BudgetResult<Self> {
        let name = validated_name(name, "Budget")?;
        let currency = validated_currency(currency)?;

        let mut budget = Self {
            id: BudgetId::new(),
            owner_id,
            name,
            period,
            currency,
            status: BudgetStatus::Draft,
            categories: Vec::new(),
            audit: AuditFields::default(),
            deletion: SoftDeleteFields::default(),
            pending_events: Vec::new(),
        };
        budget.raise(DomainEvent::BudgetCreated {
            budget_id: budget.id,
            owner_id,
            name: budget.name.clone(),
            period,
            currency: budget.currency.clone(),
        });
        debug!(budget = %budget.id, name = %budget.name, %period, "Budget created");
        Ok(budget)
    }

    /// Move a draft budget to active
    ///
    /// At least one category anywhere in the tree must plan a positive
    /// amount.
    pub fn activate(&mut self) -> BudgetResult<()> {
        if self.status != BudgetStatus::Draft {
            return Err(BudgetError::invalid_transition("activate", self.status));
        }
        if self.categories.is_empty() {
            return Err(BudgetError::ActivationValidation(
                "the budget has no categories".into(),
            ));
        }
        let has_positive = self
            .get_all_categories()
            .iter()
            .any(|c| c.planned_amount().is_some_and(Money::is_positive));
        if !has_positive {
            return Err(BudgetError::ActivationValidation(
                "no category has a planned amount greater than zero".into(),
            ));
        }

        self.status = BudgetStatus::Active;
        self.raise(DomainEvent::BudgetActivated { budget_id: self.id });
        debug!(budget = %self.id, "Budget activated");
        Ok(())
    }

    /// Add a root category and return its id
    pub fn add_category(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> BudgetResult<BudgetCategoryId> {
        if let Some(existing) = self.categories.iter().find(|c| c.has_name(name)) {
            return Err(BudgetError::DuplicateCategoryName(existing.name().to_string()));
        }
        let display_order = self.categories.len() as i32;
        let node = CategoryNode::create_root(self.id, name, description, display_order)?;
        let category_id = node.id();

        self.raise(DomainEvent::CategoryAdded {
            budget_id: self.id,
            category_id,
            parent_id: None,
            name: node.name().to_string(),
        });
        debug!(budget = %self.id, category = %category_id, name = node.name(), "Category added");
        self.categories.push(node);
        Ok(category_id)
    }

    /// Add a subcategory under a root category and return its id
    pub fn add_subcategory(
        &mut self,
        parent_id: BudgetCategoryId,
        name: &str,
        description: Option<&str>,
    ) -> BudgetResult<BudgetCategoryId> {
        let index = match self.locate(parent_id) {
            Some(Location::Root(index)) => index,
            Some(Location::Child(..)) => return Err(BudgetError::MaxDepthExceeded),
            None => return Err(BudgetError::CategoryNotFound(parent_id)),
        };

        let parent = &mut self.categories[index];
        let display_order = parent.children().len() as i32;
        let child = parent.create_child(name, description, display_order)?;
        let (category_id, child_name) = (child.id(), child.name().to_string());

        debug!(budget = %self.id, parent = %parent_id, category = %category_id, "Subcategory added");
        self.raise(DomainEvent::CategoryAdded {
            budget_id: self.id,
            category_id,
            parent_id: Some(parent_id),
            name: child_name,
        });
        Ok(category_id)
    }

    pub fn rename_category(&mut self, id: BudgetCategoryId, new_name: &str) -> BudgetResult<()> {
        let location = self.require(id)?;
        let siblings = self.sibling_names(location);
        let node = self.node_mut(location);
        let old_name = node.rename(new_name, &siblings)?;
        let new_name = node.name().to_string();

        debug!(budget = %self.id, category = %id, %old_name, %new_name, "Category renamed");
        self.raise(DomainEvent::CategoryRenamed {
            budget_id: self.id,
            category_id: id,
            old_name,
            new_name,
        });
        Ok(())
    }

    /// Set a category's planned amount, returning the previous one
    pub fn set_planned_amount(
        &mut self,
        id: BudgetCategoryId,
        amount: Money,
    ) -> BudgetResult<Option<Money>> {
        let location = self.require(id)?;
        let currency = self.currency.clone();
        let previous = self
            .node_mut(location)
            .set_planned_amount(amount.clone(), &currency)?;

        debug!(budget = %self.id, category = %id, %amount, "Planned amount set");
        self.raise(DomainEvent::PlannedAmountSet {
            budget_id: self.id,
            category_id: id,
            amount,
            previous: previous.clone(),
        });
        Ok(previous)
    }

    /// Clear a category's planned amount, returning the previous one
    pub fn clear_planned_amount(&mut self, id: BudgetCategoryId) -> BudgetResult<Option<Money>> {
        let location = self.require(id)?;
        let previous = self.node_mut(location).clear_planned_amount();

        debug!(budget = %self.id, category = %id, "Planned amount cleared");
        self.raise(DomainEvent::PlannedAmountCleared {
            budget_id: self.id,
            category_id: id,
            previous: previous.clone(),
        });
        Ok(previous)
    }

    pub fn reorder_category(&mut self, id: BudgetCategoryId, display_order: i32) -> BudgetResult<()> {
        let location = self.require(id)?;
        self.node_mut(location).reorder(display_order)?;

        debug!(budget = %self.id, category = %id, display_order, "Category reordered");
        self.raise(DomainEvent::CategoryReordered {
            budget_id: self.id,
            category_id: id,
            display_order,
        });
        Ok(())
    }

    pub fn update_category_description(
        &mut self,
        id: BudgetCategoryId,
        description: Option<&str>,
    ) -> BudgetResult<()> {
        let location = self.require(id)?;
        let description = self.node_mut(location).update_description(description);

        debug!(budget = %self.id, category = %id, "Category description updated");
        self.raise(DomainEvent::CategoryDescriptionUpdated {
            budget_id: self.id,
            category_id: id,
            description,
        });
        Ok(())
    }

    /// Remove a leaf category with no planned amount
    ///
    /// Remaining siblings keep their display order.
    pub fn remove_category(&mut self, id: BudgetCategoryId) -> BudgetResult<()> {
        let location = self.require(id)?;
        let node = self.node(location);
        if !node.is_leaf() {
            return Err(BudgetError::CategoryHasChildren(id));
        }
        if node.planned_amount().is_some() {
            return Err(BudgetError::CategoryHasPlannedAmount(id));
        }

        let removed = match location {
            Location::Root(index) => self.categories.remove(index),
            Location::Child(root, index) => self.categories[root].children_mut().remove(index),
        };

        debug!(budget = %self.id, category = %id, "Category removed");
        self.raise(DomainEvent::CategoryRemoved {
            budget_id: self.id,
            category_id: id,
            parent_id: removed.parent_id(),
            name: removed.name().to_string(),
        });
        Ok(())
    }

    /// Rename the budget itself
    pub fn update_name(&mut self, new_name: &str) -> BudgetResult<()> {
        self.name = validated_name(new_name, "Budget")?;
        debug!(budget = %self.id, name = %self.name, "Budget renamed");
        Ok(())
    }

    /// Sum of every category's planned amount
    pub fn get_total(&self) -> BudgetResult<Money> {
        self.categories
            .iter()
            .try_fold(Money::zero(&self.currency)?, |acc, root| {
                acc.try_add(&root.calculate_total(&self.currency)?)
            })
    }

    /// Per-root totals, in display order
    pub fn get_category_totals(&self) -> BudgetResult<Vec<CategoryTotal>> {
        ordered(&self.categories)
            .into_iter()
            .map(|root| {
                Ok(CategoryTotal {
                    category_id: root.id(),
                    name: root.name().to_string(),
                    total: root.calculate_total(&self.currency)?,
                })
            })
            .collect()
    }

    /// Find a category anywhere in the tree
    pub fn find_category(&self, id: BudgetCategoryId) -> Option<&CategoryNode> {
        self.locate(id).map(|location| self.node(location))
    }

    /// Find a category by name, case-insensitively
    ///
    /// Root names win over subcategory names when both match.
    pub fn find_category_by_name(&self, name: &str) -> Option<&CategoryNode> {
        self.categories
            .iter()
            .find(|c| c.has_name(name))
            .or_else(|| {
                self.categories
                    .iter()
                    .flat_map(|root| root.children())
                    .find(|c| c.has_name(name))
            })
    }

    /// Every category, each root followed by its subcategories, in display order
    pub fn get_all_categories(&self) -> Vec<&CategoryNode> {
        ordered(&self.categories)
            .into_iter()
            .flat_map(|root| std::iter::once(root).chain(ordered(root.children())))
            .collect()
    }

    /// Events raised since the last drain, oldest first
    pub fn domain_events(&self) -> &[DomainEvent] {
        &self.pending_events
    }

    pub fn clear_domain_events(&mut self) {
        self.pending_events.clear();
    }

    /// Drain the pending events
    pub fn take_domain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn id(&self) -> BudgetId {
        self.id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> BudgetPeriod {
        self.period
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn status(&self) -> BudgetStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == BudgetStatus::Active
    }

    /// Root categories, in insertion order
    pub fn categories(&self) -> &[CategoryNode] {
        &self.categories
    }

    pub fn audit_info(&self) -> &AuditFields {
        &self.audit
    }

    pub(crate) fn category_mut(&mut self, id: BudgetCategoryId) -> Option<&mut CategoryNode> {
        self.locate(id).map(|location| self.node_mut(location))
    }

    fn raise(&mut self, event: DomainEvent) {
        self.pending_events.push(event);
    }

    fn locate(&self, id: BudgetCategoryId) -> Option<Location> {
        self.categories.iter().enumerate().find_map(|(r, root)| {
            if root.id() == id {
                return Some(Location::Root(r));
            }
            root.children()
                .iter()
                .position(|child| child.id() == id)
                .map(|c| Location::Child(r, c))
        })
    }

    fn require(&self, id: BudgetCategoryId) -> BudgetResult<Location> {
        self.locate(id).ok_or(BudgetError::CategoryNotFound(id))
    }

    fn node(&self, location: Location) -> &CategoryNode {
        match location {
            Location::Root(r) => &self.categories[r],
            Location::Child(r, c) => &self.categories[r].children()[c],
        }
    }

    fn node_mut(&mut self, location: Location) -> &mut CategoryNode {
        match location {
            Location::Root(r) => &mut self.categories[r],
            Location::Child(r, c) => &mut self.categories[r].children_mut()[c],
        }
    }

    /// Ids and names of every node sharing a parent with `location`, itself included
    fn sibling_names(&self, location: Location) -> Vec<(BudgetCategoryId, String)> {
        let siblings = match location {
            Location::Root(_) => &self.categories[..],
            Location::Child(r, _) => self.categories[r].children(),
        };
        siblings
            .iter()
            .map(|c| (c.id(), c.name().to_string()))
            .collect()
    }
}

/// Stable sort by display order
fn ordered(nodes: &[CategoryNode]) -> Vec<&CategoryNode> {
    let mut sorted: Vec<&CategoryNode> = nodes.iter().collect();
    sorted.sort_by_key(|c| c.display_order());
    sorted
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.period, self.currency)
    }
}

impl Auditable for Budget {
    fn audit_fields(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_fields_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

impl SoftDeletable for Budget {
    fn deletion(&self) -> &SoftDeleteFields {
        &self.deletion
    }

    fn deletion_mut(&mut self) -> &mut SoftDeleteFields {
        &mut self.deletion
    }
}

impl TrackedEntity for Budget {
    fn entity_key(&self) -> EntityKey {
        EntityKey::new(BUDGET_KIND, *self.id.as_uuid())
    }

    fn as_auditable_mut(&mut self) -> Option<&mut dyn Auditable> {
        Some(self)
    }

    fn as_soft_deletable(&self) -> Option<&dyn SoftDeletable> {
        Some(self)
    }

    fn as_soft_deletable_mut(&mut self) -> Option<&mut dyn SoftDeletable> {
        Some(self)
    }
}
