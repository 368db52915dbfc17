//! Strongly-typed ID wrappers
//!
//! Users, budgets and categories are all identified by a UUID. Wrapping each
//! kind in its own newtype keeps them from being mixed up at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Macro to generate ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an ID from an existing UUID
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse an ID from a string
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                s.parse()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, &self.0.simple().to_string()[..8])
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(UserId, "usr-");
define_id!(BudgetId, "bud-");
define_id!(BudgetCategoryId, "cat-");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = BudgetId::new();
        assert!(!id.as_uuid().is_nil());
    }

    #[test]
    fn test_id_display() {
        let id = BudgetCategoryId::new();
        let display = id.to_string();
        assert!(display.starts_with("cat-"));
        assert_eq!(display.len(), 12);
    }

    #[test]
    fn test_id_equality_is_by_value() {
        let uuid = Uuid::new_v4();
        assert_eq!(UserId::from_uuid(uuid), UserId::from_uuid(uuid));
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn test_id_parse_with_and_without_prefix() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let plain = BudgetId::parse(uuid_str).unwrap();
        let prefixed = BudgetId::parse(&format!("bud-{uuid_str}")).unwrap();
        assert_eq!(plain, prefixed);
        assert_eq!(plain.as_uuid().to_string(), uuid_str);
        assert!(BudgetId::parse("bud-nope").is_err());
    }

    #[test]
    fn test_id_serializes_as_bare_uuid() {
        let id = UserId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_different_id_kinds_share_only_the_uuid() {
        // BudgetId and BudgetCategoryId are distinct types; only their UUIDs compare.
        let uuid = Uuid::new_v4();
        let budget = BudgetId::from_uuid(uuid);
        let category = BudgetCategoryId::from_uuid(uuid);
        assert_eq!(budget.as_uuid(), category.as_uuid());
    }
}
