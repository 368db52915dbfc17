//! Budget category tree nodes
//!
//! Categories form a two-level forest owned by a [`Budget`](super::Budget):
//! root categories (e.g. "Housing") and their subcategories (e.g. "Rent").
//! Nodes are only mutated through the owning budget, so every mutator here is
//! crate-visible and the public surface is read-only.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BudgetCategoryId, BudgetId};
use super::money::Money;
use crate::audit::{
    AuditFields, Auditable, EntityKey, SoftDeletable, SoftDeleteFields, TrackedEntity,
};
use crate::error::{BudgetError, BudgetResult};

/// Entity kind reported to the unit of work
pub const CATEGORY_KIND: &str = "Category";

/// Longest accepted category or budget name, in characters
pub const MAX_NAME_LEN: usize = 100;

/// A category in a budget's category tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    id: BudgetCategoryId,
    budget_id: BudgetId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_id: Option<BudgetCategoryId>,
    #[serde(default)]
    planned_amount: Option<Money>,
    display_order: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<CategoryNode>,
    #[serde(default)]
    audit: AuditFields,
    #[serde(default)]
    deletion: SoftDeleteFields,
}

/// Trim and validate an entity name
pub(crate) fn validated_name(name: &str, what: &str) -> BudgetResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BudgetError::InvalidBudgetData(format!(
            "{} name cannot be empty",
            what
        )));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(BudgetError::InvalidBudgetData(format!(
            "{} name is too long (max {} characters)",
            what, MAX_NAME_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// Blank descriptions are stored as no description
fn normalized_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
}

impl CategoryNode {
    /// Create a root category
    pub(crate) fn create_root(
        budget_id: BudgetId,
        name: &str,
        description: Option<&str>,
        display_order: i32,
    ) -> BudgetResult<Self> {
        Ok(Self {
            id: BudgetCategoryId::new(),
            budget_id,
            name: validated_name(name, "Category")?,
            description: normalized_description(description),
            parent_id: None,
            planned_amount: None,
            display_order,
            children: Vec::new(),
            audit: AuditFields::default(),
            deletion: SoftDeleteFields::default(),
        })
    }

    /// Create a subcategory under this node and return it
    ///
    /// Only roots may have children; a child of a child would exceed the
    /// two-level limit.
    pub(crate) fn create_child(
        &mut self,
        name: &str,
        description: Option<&str>,
        display_order: i32,
    ) -> BudgetResult<&CategoryNode> {
        if !self.is_root() {
            return Err(BudgetError::MaxDepthExceeded);
        }
        let name = validated_name(name, "Category")?;
        if self.children.iter().any(|c| c.has_name(&name)) {
            return Err(BudgetError::DuplicateCategoryName(name));
        }

        let child = Self {
            id: BudgetCategoryId::new(),
            budget_id: self.budget_id,
            name,
            description: normalized_description(description),
            parent_id: Some(self.id),
            planned_amount: None,
            display_order,
            children: Vec::new(),
            audit: AuditFields::default(),
            deletion: SoftDeleteFields::default(),
        };
        self.children.push(child);
        let index = self.children.len() - 1;
        Ok(&self.children[index])
    }

    /// Rename the node, returning the old name
    ///
    /// `siblings` may include this node; it is skipped by id.
    pub(crate) fn rename(
        &mut self,
        new_name: &str,
        siblings: &[(BudgetCategoryId, String)],
    ) -> BudgetResult<String> {
        let new_name = validated_name(new_name, "Category")?;
        let taken = siblings
            .iter()
            .filter(|(id, _)| *id != self.id)
            .any(|(_, name)| name.to_lowercase() == new_name.to_lowercase());
        if taken {
            return Err(BudgetError::DuplicateCategoryName(new_name));
        }
        Ok(std::mem::replace(&mut self.name, new_name))
    }

    /// Set the planned amount, returning the previous one
    pub(crate) fn set_planned_amount(
        &mut self,
        amount: Money,
        budget_currency: &str,
    ) -> BudgetResult<Option<Money>> {
        if amount.is_negative() {
            return Err(BudgetError::InvalidAmount(format!(
                "planned amount cannot be negative ({})",
                amount
            )));
        }
        if amount.currency() != budget_currency {
            return Err(BudgetError::InvalidAmount(format!(
                "planned amount is in {} but the budget uses {}",
                amount.currency(),
                budget_currency
            )));
        }
        Ok(self.planned_amount.replace(amount))
    }

    pub(crate) fn clear_planned_amount(&mut self) -> Option<Money> {
        self.planned_amount.take()
    }

    pub(crate) fn reorder(&mut self, display_order: i32) -> BudgetResult<()> {
        if display_order < 0 {
            return Err(BudgetError::InvalidBudgetData(format!(
                "display order cannot be negative ({})",
                display_order
            )));
        }
        self.display_order = display_order;
        Ok(())
    }

    pub(crate) fn update_description(&mut self, description: Option<&str>) -> Option<String> {
        self.description = normalized_description(description);
        self.description.clone()
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<CategoryNode> {
        &mut self.children
    }

    /// Check a node read from storage against the tree rules
    ///
    /// `parent` is the id of the node holding this one, `None` for roots.
    pub(crate) fn validate_loaded(
        &self,
        parent: Option<BudgetCategoryId>,
        currency: &str,
    ) -> BudgetResult<()> {
        validated_name(&self.name, "Category")?;
        if self.parent_id != parent {
            return Err(BudgetError::InvalidBudgetData(format!(
                "category {} does not belong under its stored parent",
                self.id
            )));
        }
        if parent.is_some() && !self.children.is_empty() {
            return Err(BudgetError::MaxDepthExceeded);
        }
        if let Some(amount) = &self.planned_amount {
            if amount.currency() != currency {
                return Err(BudgetError::InvalidBudgetData(format!(
                    "category {} plans {} in a {} budget",
                    self.id, amount, currency
                )));
            }
        }
        for child in &self.children {
            child.validate_loaded(Some(self.id), currency)?;
        }
        Ok(())
    }

    /// This node's planned amount (or zero) plus every descendant's total
    pub fn calculate_total(&self, currency: &str) -> BudgetResult<Money> {
        let own = match &self.planned_amount {
            Some(amount) => amount.clone(),
            None => Money::zero(currency)?,
        };
        self.children
            .iter()
            .try_fold(own, |acc, child| acc.try_add(&child.calculate_total(currency)?))
    }

    pub fn id(&self) -> BudgetCategoryId {
        self.id
    }

    pub fn budget_id(&self) -> BudgetId {
        self.budget_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parent_id(&self) -> Option<BudgetCategoryId> {
        self.parent_id
    }

    pub fn planned_amount(&self) -> Option<&Money> {
        self.planned_amount.as_ref()
    }

    pub fn display_order(&self) -> i32 {
        self.display_order
    }

    pub fn children(&self) -> &[CategoryNode] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// 0 for roots, 1 for subcategories
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            1
        }
    }

    /// Case-insensitive name match
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    pub fn audit_info(&self) -> &AuditFields {
        &self.audit
    }
}

impl fmt::Display for CategoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Auditable for CategoryNode {
    fn audit_fields(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_fields_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

impl SoftDeletable for CategoryNode {
    fn deletion(&self) -> &SoftDeleteFields {
        &self.deletion
    }

    fn deletion_mut(&mut self) -> &mut SoftDeleteFields {
        &mut self.deletion
    }
}

impl TrackedEntity for CategoryNode {
    fn entity_key(&self) -> EntityKey {
        EntityKey::new(CATEGORY_KIND, *self.id.as_uuid())
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

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, "USD").unwrap()
    }

    fn root(name: &str) -> CategoryNode {
        CategoryNode::create_root(BudgetId::new(), name, None, 0).unwrap()
    }

    #[test]
    fn test_create_root_trims() {
        let node = CategoryNode::create_root(BudgetId::new(), "  Housing ", Some("  "), 3).unwrap();
        assert_eq!(node.name(), "Housing");
        assert_eq!(node.description(), None);
        assert_eq!(node.display_order(), 3);
        assert!(node.is_root());
        assert!(node.is_leaf());
        assert_eq!(node.depth(), 0);
    }

    #[test]
    fn test_create_root_rejects_blank_name() {
        let err = CategoryNode::create_root(BudgetId::new(), "   ", None, 0).unwrap_err();
        assert!(matches!(err, BudgetError::InvalidBudgetData(_)));
    }

    #[test]
    fn test_create_root_rejects_long_name() {
        let name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(CategoryNode::create_root(BudgetId::new(), &name, None, 0).is_err());
    }

    #[test]
    fn test_create_child() {
        let mut housing = root("Housing");
        let child_id = housing.create_child("Rent", Some("flat"), 0).unwrap().id();

        assert!(!housing.is_leaf());
        let rent = &housing.children()[0];
        assert_eq!(rent.id(), child_id);
        assert_eq!(rent.parent_id(), Some(housing.id()));
        assert_eq!(rent.budget_id(), housing.budget_id());
        assert_eq!(rent.description(), Some("flat"));
        assert_eq!(rent.depth(), 1);
    }

    #[test]
    fn test_create_child_rejects_duplicate_sibling_case_insensitive() {
        let mut housing = root("Housing");
        housing.create_child("Rent", None, 0).unwrap();

        let err = housing.create_child("RENT", None, 1).unwrap_err();
        assert_eq!(err, BudgetError::DuplicateCategoryName("RENT".into()));
    }

    #[test]
    fn test_child_cannot_have_children() {
        let mut housing = root("Housing");
        housing.create_child("Rent", None, 0).unwrap();

        let rent = &mut housing.children_mut()[0];
        assert_eq!(
            rent.create_child("Deposit", None, 0).unwrap_err(),
            BudgetError::MaxDepthExceeded
        );
    }

    #[test]
    fn test_rename_excludes_self() {
        let mut node = root("Food");
        let siblings = vec![(node.id(), "Food".to_string()), (BudgetCategoryId::new(), "Fun".to_string())];

        let old = node.rename("food", &siblings).unwrap();
        assert_eq!(old, "Food");
        assert_eq!(node.name(), "food");
    }

    #[test]
    fn test_rename_rejects_sibling_name() {
        let mut node = root("Food");
        let siblings = vec![(BudgetCategoryId::new(), "Transport".to_string())];

        let err = node.rename(" transport ", &siblings).unwrap_err();
        assert!(matches!(err, BudgetError::DuplicateCategoryName(_)));
        assert_eq!(node.name(), "Food");
    }

    #[test]
    fn test_rename_rejects_blank() {
        let mut node = root("Food");
        assert!(node.rename("", &[]).unwrap_err().is_validation());
    }

    #[test]
    fn test_set_planned_amount() {
        let mut node = root("Food");

        assert_eq!(node.set_planned_amount(usd(dec!(100)), "USD").unwrap(), None);
        let previous = node.set_planned_amount(usd(dec!(0)), "USD").unwrap();
        assert_eq!(previous, Some(usd(dec!(100))));
        assert!(node.planned_amount().unwrap().is_zero());
    }

    #[test]
    fn test_set_planned_amount_rejects_negative_and_foreign_currency() {
        let mut node = root("Food");

        let negative = node.set_planned_amount(usd(dec!(-1)), "USD").unwrap_err();
        assert!(matches!(negative, BudgetError::InvalidAmount(_)));

        let zar = Money::new(dec!(10), "ZAR").unwrap();
        let mismatch = node.set_planned_amount(zar, "USD").unwrap_err();
        assert!(matches!(mismatch, BudgetError::InvalidAmount(_)));
        assert!(node.planned_amount().is_none());
    }

    #[test]
    fn test_clear_planned_amount() {
        let mut node = root("Food");
        assert_eq!(node.clear_planned_amount(), None);

        node.set_planned_amount(usd(dec!(5)), "USD").unwrap();
        assert_eq!(node.clear_planned_amount(), Some(usd(dec!(5))));
        assert!(node.planned_amount().is_none());
    }

    #[test]
    fn test_calculate_total_recurses() {
        let mut housing = root("Housing");
        housing.set_planned_amount(usd(dec!(10)), "USD").unwrap();
        housing.create_child("Rent", None, 0).unwrap();
        housing.create_child("Power", None, 1).unwrap();
        housing.children_mut()[0]
            .set_planned_amount(usd(dec!(900.50)), "USD")
            .unwrap();
        housing.children_mut()[1]
            .set_planned_amount(usd(dec!(89.50)), "USD")
            .unwrap();

        assert_eq!(housing.calculate_total("USD").unwrap(), usd(dec!(1000)));
    }

    #[test]
    fn test_calculate_total_of_empty_node_is_zero() {
        assert!(root("Fun").calculate_total("EUR").unwrap().is_zero());
    }

    #[test]
    fn test_reorder_and_description() {
        let mut node = root("Fun");
        node.reorder(4).unwrap();
        assert_eq!(node.display_order(), 4);
        assert!(node.reorder(-1).is_err());

        assert_eq!(node.update_description(Some(" games ")), Some("games".into()));
        assert_eq!(node.update_description(None), None);
    }

    #[test]
    fn test_serialization() {
        let mut housing = root("Housing");
        housing.create_child("Rent", None, 0).unwrap();
        housing.set_planned_amount(usd(dec!(12.5)), "USD").unwrap();

        let json = serde_json::to_string(&housing).unwrap();
        let back: CategoryNode = serde_json::from_str(&json).unwrap();
        assert_eq!(housing, back);
    }
}
