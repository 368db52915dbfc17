//! Domain events raised by the budget aggregate
//!
//! Events accumulate on the aggregate in the order they happened. The
//! aggregate never dispatches them; callers drain them after a successful
//! commit.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BudgetCategoryId, BudgetId, UserId};
use super::money::Money;
use super::period::BudgetPeriod;

/// A significant state change in a budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    BudgetCreated {
        budget_id: BudgetId,
        owner_id: UserId,
        name: String,
        period: BudgetPeriod,
        currency: String,
    },
    BudgetActivated {
        budget_id: BudgetId,
    },
    CategoryAdded {
        budget_id: BudgetId,
        category_id: BudgetCategoryId,
        parent_id: Option<BudgetCategoryId>,
        name: String,
    },
    CategoryRenamed {
        budget_id: BudgetId,
        category_id: BudgetCategoryId,
        old_name: String,
        new_name: String,
    },
    PlannedAmountSet {
        budget_id: BudgetId,
        category_id: BudgetCategoryId,
        amount: Money,
        previous: Option<Money>,
    },
    PlannedAmountCleared {
        budget_id: BudgetId,
        category_id: BudgetCategoryId,
        previous: Option<Money>,
    },
    CategoryReordered {
        budget_id: BudgetId,
        category_id: BudgetCategoryId,
        display_order: i32,
    },
    CategoryDescriptionUpdated {
        budget_id: BudgetId,
        category_id: BudgetCategoryId,
        description: Option<String>,
    },
    CategoryRemoved {
        budget_id: BudgetId,
        category_id: BudgetCategoryId,
        parent_id: Option<BudgetCategoryId>,
        name: String,
    },
}

impl DomainEvent {
    /// Stable event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::BudgetCreated { .. } => "BudgetCreated",
            Self::BudgetActivated { .. } => "BudgetActivated",
            Self::CategoryAdded { .. } => "CategoryAdded",
            Self::CategoryRenamed { .. } => "CategoryRenamed",
            Self::PlannedAmountSet { .. } => "PlannedAmountSet",
            Self::PlannedAmountCleared { .. } => "PlannedAmountCleared",
            Self::CategoryReordered { .. } => "CategoryReordered",
            Self::CategoryDescriptionUpdated { .. } => "CategoryDescriptionUpdated",
            Self::CategoryRemoved { .. } => "CategoryRemoved",
        }
    }

    /// The budget that raised the event
    pub fn budget_id(&self) -> BudgetId {
        match self {
            Self::BudgetCreated { budget_id, .. }
            | Self::BudgetActivated { budget_id }
            | Self::CategoryAdded { budget_id, .. }
            | Self::CategoryRenamed { budget_id, .. }
            | Self::PlannedAmountSet { budget_id, .. }
            | Self::PlannedAmountCleared { budget_id, .. }
            | Self::CategoryReordered { budget_id, .. }
            | Self::CategoryDescriptionUpdated { budget_id, .. }
            | Self::CategoryRemoved { budget_id, .. } => *budget_id,
        }
    }
}

impl fmt::Display for DomainEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BudgetCreated { name, period, .. } => {
                write!(f, "Budget '{}' created for {}", name, period)
            }
            Self::BudgetActivated { budget_id } => write!(f, "Budget {} activated", budget_id),
            Self::CategoryAdded { name, parent_id, .. } => match parent_id {
                Some(parent) => write!(f, "Subcategory '{}' added under {}", name, parent),
                None => write!(f, "Category '{}' added", name),
            },
            Self::CategoryRenamed { old_name, new_name, .. } => {
                write!(f, "Category '{}' renamed to '{}'", old_name, new_name)
            }
            Self::PlannedAmountSet { category_id, amount, .. } => {
                write!(f, "Planned amount of {} set to {}", category_id, amount)
            }
            Self::PlannedAmountCleared { category_id, .. } => {
                write!(f, "Planned amount of {} cleared", category_id)
            }
            Self::CategoryReordered { category_id, display_order, .. } => {
                write!(f, "Category {} moved to position {}", category_id, display_order)
            }
            Self::CategoryDescriptionUpdated { category_id, .. } => {
                write!(f, "Description of {} updated", category_id)
            }
            Self::CategoryRemoved { name, .. } => write!(f, "Category '{}' removed", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_and_budget() {
        let budget_id = BudgetId::new();
        let event = DomainEvent::CategoryAdded {
            budget_id,
            category_id: BudgetCategoryId::new(),
            parent_id: None,
            name: "Housing".into(),
        };
        assert_eq!(event.name(), "CategoryAdded");
        assert_eq!(event.budget_id(), budget_id);
        assert_eq!(event.to_string(), "Category 'Housing' added");
    }

    #[test]
    fn test_serialization_is_tagged() {
        let event = DomainEvent::BudgetActivated {
            budget_id: BudgetId::new(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"BudgetActivated\""));
        let back: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
