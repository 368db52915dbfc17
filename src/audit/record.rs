//! Audit journal record data structures
//!
//! Defines the operations a save cycle can record and the shape of one line
//! in the audit journal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cascade::ReportEntry;
use super::fields::AuditOperation;
use crate::models::ids::UserId;

/// Types of operations that are journaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Entity was created
    Create,
    /// Entity was updated
    Update,
    /// Entity was flagged deleted by a cascade
    SoftDelete,
}

impl From<AuditOperation> for Operation {
    fn from(op: AuditOperation) -> Self {
        match op {
            AuditOperation::Create => Operation::Create,
            AuditOperation::Update => Operation::Update,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::SoftDelete => write!(f, "SOFT_DELETE"),
        }
    }
}

/// A single audit journal record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// When the stamp was taken (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    /// Kind of entity affected ("Budget", "Category", ...)
    pub entity_kind: String,

    /// UUID of the affected entity
    pub entity_id: String,

    pub actor_id: UserId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// Human-readable diff summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<String>,
}

impl From<&ReportEntry> for AuditRecord {
    fn from(entry: &ReportEntry) -> Self {
        Self {
            timestamp: entry.stamp.timestamp,
            operation: entry.operation,
            entity_kind: entry.key.kind.to_string(),
            entity_id: entry.key.id.to_string(),
            actor_id: entry.stamp.actor_id,
            correlation_id: entry.stamp.correlation_id.clone(),
            changes: entry.changes.clone(),
        }
    }
}

impl AuditRecord {
    /// Format the record for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {} by {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_kind,
            self.entity_id,
            self.actor_id
        );

        if let Some(changes) = &self.changes {
            output.push_str(&format!("\n  Changes: {}", changes));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::stamp::AuditStamp;
    use crate::audit::tracking::EntityKey;
    use uuid::Uuid;

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Create.to_string(), "CREATE");
        assert_eq!(Operation::Update.to_string(), "UPDATE");
        assert_eq!(Operation::SoftDelete.to_string(), "SOFT_DELETE");
    }

    #[test]
    fn test_from_report_entry() {
        let id = Uuid::new_v4();
        let stamp = AuditStamp::new(UserId::new(), Utc::now()).with_correlation_id("c-9");
        let mut entry = ReportEntry::new(EntityKey::new("Category", id), Operation::SoftDelete, stamp.clone());
        entry.changes = Some("is_deleted: false -> true".into());

        let record = AuditRecord::from(&entry);

        assert_eq!(record.entity_kind, "Category");
        assert_eq!(record.entity_id, id.to_string());
        assert_eq!(record.actor_id, stamp.actor_id);
        assert_eq!(record.correlation_id.as_deref(), Some("c-9"));
        let text = record.format_human_readable();
        assert!(text.contains("SOFT_DELETE Category"));
        assert!(text.contains("Changes: is_deleted"));
    }

    #[test]
    fn test_serialization() {
        let stamp = AuditStamp::new(UserId::new(), Utc::now());
        let entry = ReportEntry::new(EntityKey::new("Budget", Uuid::new_v4()), Operation::Create, stamp);
        let record = AuditRecord::from(&entry);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"operation\":\"create\""));
        assert!(!json.contains("changes"));
        let back: AuditRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
