//! The change-tracking contract a unit of work exposes at save time
//!
//! A unit of work knows which entities it is tracking, what state each one is
//! in relative to storage, and which related entities are currently loaded in
//! memory. [`UnitOfWork`] exposes exactly that, and nothing about how the
//! entities are stored.

use std::fmt;

use uuid::Uuid;

use super::fields::{Auditable, SoftDeletable};

/// Identity of a tracked entity: its kind plus its UUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub kind: &'static str,
    pub id: Uuid,
}

impl EntityKey {
    pub const fn new(kind: &'static str, id: Uuid) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Reconciliation state of a tracked entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Not yet in storage
    Added,
    /// In storage and changed since it was loaded
    Modified,
    /// In storage and unchanged
    Unchanged,
    /// In storage and about to be physically removed
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// To-one reference
    Reference,
    /// To-many collection
    Collection,
}

/// A relationship from one tracked entity to others
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub name: &'static str,
    pub kind: NavigationKind,
    /// Whether the related entities are materialized in memory
    pub loaded: bool,
    /// Related entities; only meaningful when `loaded`
    pub targets: Vec<EntityKey>,
}

impl Navigation {
    pub fn collection(name: &'static str, targets: Vec<EntityKey>) -> Self {
        Self {
            name,
            kind: NavigationKind::Collection,
            loaded: true,
            targets,
        }
    }

    pub fn reference(name: &'static str, target: Option<EntityKey>) -> Self {
        Self {
            name,
            kind: NavigationKind::Reference,
            loaded: true,
            targets: target.into_iter().collect(),
        }
    }

    pub fn unloaded(name: &'static str, kind: NavigationKind) -> Self {
        Self {
            name,
            kind,
            loaded: false,
            targets: Vec::new(),
        }
    }
}

/// One row of the change tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntry {
    pub key: EntityKey,
    pub state: EntityState,
    /// The soft-delete flag as it was when tracking began
    pub was_deleted: bool,
    pub navigations: Vec<Navigation>,
}

/// An entity the unit of work can hand out for save-time processing
pub trait TrackedEntity {
    fn entity_key(&self) -> EntityKey;

    fn as_auditable_mut(&mut self) -> Option<&mut dyn Auditable> {
        None
    }

    fn as_soft_deletable(&self) -> Option<&dyn SoftDeletable> {
        None
    }

    fn as_soft_deletable_mut(&mut self) -> Option<&mut dyn SoftDeletable> {
        None
    }
}

/// A set of tracked entities about to be committed
pub trait UnitOfWork {
    /// Snapshot of everything currently tracked
    fn entries(&self) -> Vec<TrackedEntry>;

    /// Mutable access to a tracked entity
    fn entity_mut(&mut self, key: &EntityKey) -> Option<&mut dyn TrackedEntity>;

    /// Flag an entity as changed by save-time processing
    fn mark_modified(&mut self, key: &EntityKey);
}
