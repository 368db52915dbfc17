//! Audit stamps and the factories that produce them
//!
//! The core never reads a clock or an identity itself. Whoever saves a unit of
//! work supplies an [`AuditStampFactory`], and every stamp written during that
//! save comes from it.

use std::cell::Cell;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ids::UserId;

/// Who did something, when, and under which correlation id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub actor_id: UserId,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl AuditStamp {
    pub fn new(actor_id: UserId, timestamp: DateTime<Utc>) -> Self {
        Self {
            actor_id,
            timestamp,
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

/// Supplies a fresh [`AuditStamp`] on demand
pub trait AuditStampFactory {
    fn create_stamp(&self) -> AuditStamp;
}

/// Stamps with a fixed actor and the system clock
///
/// Every stamp from one factory shares a correlation id, so all writes made
/// during one save can be tied back together.
#[derive(Debug, Clone)]
pub struct SystemStampFactory {
    actor_id: UserId,
    correlation_id: String,
}

impl SystemStampFactory {
    /// Create a factory for `actor_id` with a newly generated correlation id
    pub fn new(actor_id: UserId) -> Self {
        Self {
            actor_id,
            correlation_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_correlation_id(actor_id: UserId, correlation_id: impl Into<String>) -> Self {
        Self {
            actor_id,
            correlation_id: correlation_id.into(),
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

impl AuditStampFactory for SystemStampFactory {
    fn create_stamp(&self) -> AuditStamp {
        AuditStamp::new(self.actor_id, Utc::now()).with_correlation_id(self.correlation_id.clone())
    }
}

/// Hands out the same stamp every time and counts how often it was asked
///
/// Useful for replaying saves deterministically and in tests.
#[derive(Debug)]
pub struct FixedStampFactory {
    stamp: AuditStamp,
    calls: Cell<usize>,
}

impl FixedStampFactory {
    pub fn new(stamp: AuditStamp) -> Self {
        Self {
            stamp,
            calls: Cell::new(0),
        }
    }

    /// Number of stamps handed out so far
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl AuditStampFactory for FixedStampFactory {
    fn create_stamp(&self) -> AuditStamp {
        self.calls.set(self.calls.get() + 1);
        self.stamp.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_factory_shares_correlation_id() {
        let actor = UserId::new();
        let factory = SystemStampFactory::with_correlation_id(actor, "req-42");
        let first = factory.create_stamp();
        let second = factory.create_stamp();

        assert_eq!(first.actor_id, actor);
        assert_eq!(first.correlation_id.as_deref(), Some("req-42"));
        assert_eq!(first.correlation_id, second.correlation_id);
        assert!(second.timestamp >= first.timestamp);
    }

    #[test]
    fn test_fixed_factory_counts_calls() {
        let stamp = AuditStamp::new(UserId::new(), Utc::now());
        let factory = FixedStampFactory::new(stamp.clone());
        assert_eq!(factory.calls(), 0);
        assert_eq!(factory.create_stamp(), stamp);
        assert_eq!(factory.create_stamp(), stamp);
        assert_eq!(factory.calls(), 2);
    }
}
