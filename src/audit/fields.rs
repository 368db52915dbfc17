//! Audit and soft-delete metadata carried by persisted entities
//!
//! Entities opt into the save-time machinery by implementing [`Auditable`]
//! and/or [`SoftDeletable`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stamp::{AuditStamp, AuditStampFactory};
use crate::models::ids::UserId;

/// What kind of write an audit stamp records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOperation {
    /// Entity is being inserted
    Create,
    /// Entity already exists and is being updated
    Update,
}

/// Created/modified metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl AuditFields {
    /// Record `stamp` against these fields
    ///
    /// A create sets both the created and modified pairs; an update only
    /// touches the modified pair.
    pub fn apply(&mut self, stamp: &AuditStamp, operation: AuditOperation) {
        if operation == AuditOperation::Create {
            self.created_by = Some(stamp.actor_id);
            self.created_at = Some(stamp.timestamp);
        }
        self.modified_by = Some(stamp.actor_id);
        self.modified_at = Some(stamp.timestamp);
        self.correlation_id = stamp.correlation_id.clone();
    }
}

/// Logical-deletion metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftDeleteFields {
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDeleteFields {
    pub fn mark(&mut self, stamp: &AuditStamp) {
        self.is_deleted = true;
        self.deleted_by = Some(stamp.actor_id);
        self.deleted_at = Some(stamp.timestamp);
    }
}

/// An entity whose creation and modification are stamped at save time
pub trait Auditable {
    fn audit_fields(&self) -> &AuditFields;

    fn audit_fields_mut(&mut self) -> &mut AuditFields;

    /// Ask `factory` for exactly one stamp and record it
    fn audit(&mut self, factory: &dyn AuditStampFactory, operation: AuditOperation) -> AuditStamp {
        let stamp = factory.create_stamp();
        self.audit_fields_mut().apply(&stamp, operation);
        stamp
    }
}

/// An entity that is flagged as deleted instead of being removed
pub trait SoftDeletable {
    fn deletion(&self) -> &SoftDeleteFields;

    fn deletion_mut(&mut self) -> &mut SoftDeleteFields;

    fn is_deleted(&self) -> bool {
        self.deletion().is_deleted
    }

    /// Ask `factory` for exactly one stamp and mark the entity deleted with it
    fn soft_delete(&mut self, factory: &dyn AuditStampFactory) -> AuditStamp {
        let stamp = factory.create_stamp();
        self.deletion_mut().mark(&stamp);
        stamp
    }
}
