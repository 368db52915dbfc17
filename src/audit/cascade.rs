//! Save-time audit stamping and soft-delete cascading
//!
//! [`AuditCascadeWalker::before_save`] runs once per save cycle, just before a
//! unit of work commits. It makes two passes over the tracked entries:
//!
//! 1. Every [`Auditable`](super::Auditable) entity that is `Added` or
//!    `Modified` is stamped once (`Create` or `Update` respectively).
//! 2. Every [`SoftDeletable`](super::SoftDeletable) entity that is `Modified`
//!    and has just been flagged deleted pulls its loaded navigations down with
//!    it: each related entity that is not already deleted is soft-deleted with
//!    its own stamp.
//!
//! The cascade only reaches entities that are already in memory, and it goes
//! one level deep per save cycle. A visited set keeps any entity from being
//! processed twice in the same cycle.

use std::collections::HashSet;

use tracing::{debug, info, trace};

use super::fields::AuditOperation;
use super::record::Operation;
use super::stamp::{AuditStamp, AuditStampFactory};
use super::tracking::{EntityKey, EntityState, TrackedEntry, UnitOfWork};

/// One stamp written during a save cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub key: EntityKey,
    pub operation: Operation,
    pub stamp: AuditStamp,
    /// Human-readable summary of what changed, when the unit of work knows it
    pub changes: Option<String>,
}

impl ReportEntry {
    pub fn new(key: EntityKey, operation: Operation, stamp: AuditStamp) -> Self {
        Self {
            key,
            operation,
            stamp,
            changes: None,
        }
    }
}

/// Everything a save cycle stamped or cascaded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveCycleReport {
    /// Create/update stamps, in tracking order
    pub stamped: Vec<ReportEntry>,
    /// Entities soft-deleted by the cascade, in visiting order
    pub cascaded: Vec<ReportEntry>,
}

impl SaveCycleReport {
    pub fn is_empty(&self) -> bool {
        self.stamped.is_empty() && self.cascaded.is_empty()
    }

    /// All entries, stamps first
    pub fn entries(&self) -> impl Iterator<Item = &ReportEntry> {
        self.stamped.iter().chain(self.cascaded.iter())
    }

    /// Number of stamps requested from the factory during the cycle
    pub fn stamp_count(&self) -> usize {
        self.stamped.len() + self.cascaded.len()
    }

    pub fn was_cascaded(&self, key: &EntityKey) -> bool {
        self.cascaded.iter().any(|e| &e.key == key)
    }
}

/// Applies audit stamps and soft-delete cascades to a unit of work
#[derive(Debug, Default, Clone, Copy)]
pub struct AuditCascadeWalker;

impl AuditCascadeWalker {
    pub fn new() -> Self {
        Self
    }

    /// Process one save cycle
    pub fn before_save<U>(&self, uow: &mut U, factory: &dyn AuditStampFactory) -> SaveCycleReport
    where
        U: UnitOfWork + ?Sized,
    {
        let entries = uow.entries();
        let mut report = SaveCycleReport::default();

        for entry in &entries {
            let operation = match entry.state {
                EntityState::Added => AuditOperation::Create,
                EntityState::Modified => AuditOperation::Update,
                EntityState::Unchanged | EntityState::Deleted => continue,
            };
            let Some(auditable) = uow
                .entity_mut(&entry.key)
                .and_then(|entity| entity.as_auditable_mut())
            else {
                continue;
            };

            let stamp = auditable.audit(factory, operation);
            trace!(entity = %entry.key, ?operation, "Stamped entity");
            report
                .stamped
                .push(ReportEntry::new(entry.key, operation.into(), stamp));
        }

        // parents are fixed before the first cascade; cascaded entities never act as parents in the same cycle
        let parents: Vec<&TrackedEntry> = entries
            .iter()
            .filter(|e| e.state == EntityState::Modified && !e.was_deleted)
            .filter(|e| {
                uow.entity_mut(&e.key)
                    .and_then(|entity| entity.as_soft_deletable().map(|d| d.is_deleted()))
                    .unwrap_or(false)
            })
            .collect();
        let mut visited: HashSet<EntityKey> = parents.iter().map(|e| e.key).collect();

        for entry in parents {
            for navigation in &entry.navigations {
                if !navigation.loaded {
                    debug!(
                        entity = %entry.key,
                        navigation = navigation.name,
                        "Navigation not loaded, cascade skipped"
                    );
                    continue;
                }

                for target in &navigation.targets {
                    if visited.contains(target) {
                        continue;
                    }
                    let Some(deletable) = uow
                        .entity_mut(target)
                        .and_then(|entity| entity.as_soft_deletable_mut())
                    else {
                        continue;
                    };
                    if deletable.is_deleted() {
                        continue;
                    }

                    let stamp = deletable.soft_delete(factory);
                    visited.insert(*target);
                    uow.mark_modified(target);
                    debug!(parent = %entry.key, entity = %target, "Cascaded soft delete");
                    report
                        .cascaded
                        .push(ReportEntry::new(*target, Operation::SoftDelete, stamp));
                }
            }
        }

        if !report.is_empty() {
            info!(
                stamped = report.stamped.len(),
                cascaded = report.cascaded.len(),
                "Save cycle audited"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::audit::fields::{AuditFields, Auditable, SoftDeletable, SoftDeleteFields};
    use crate::audit::stamp::FixedStampFactory;
    use crate::audit::tracking::{Navigation, NavigationKind, TrackedEntity};
    use crate::models::ids::UserId;

    /// A minimal entity graph, independent of the budget model
    #[derive(Default)]
    struct Node {
        id: Uuid,
        audit: AuditFields,
        deletion: SoftDeleteFields,
    }

    impl Auditable for Node {
        fn audit_fields(&self) -> &AuditFields {
            &self.audit
        }
        fn audit_fields_mut(&mut self) -> &mut AuditFields {
            &mut self.audit
        }
    }

    impl SoftDeletable for Node {
        fn deletion(&self) -> &SoftDeleteFields {
            &self.deletion
        }
        fn deletion_mut(&mut self) -> &mut SoftDeleteFields {
            &mut self.deletion
        }
    }

    impl TrackedEntity for Node {
        fn entity_key(&self) -> EntityKey {
            EntityKey::new("Node", self.id)
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

    #[derive(Default)]
    struct Graph {
        nodes: HashMap<Uuid, Node>,
        entries: Vec<TrackedEntry>,
        marked: Vec<EntityKey>,
    }

    impl Graph {
        fn add(&mut self, state: EntityState, was_deleted: bool, navigations: Vec<Navigation>) -> EntityKey {
            let node = Node {
                id: Uuid::new_v4(),
                ..Node::default()
            };
            let key = node.entity_key();
            self.nodes.insert(node.id, node);
            self.entries.push(TrackedEntry {
                key,
                state,
                was_deleted,
                navigations,
            });
            key
        }

        fn node(&self, key: &EntityKey) -> &Node {
            &self.nodes[&key.id]
        }

        fn delete(&mut self, key: &EntityKey) {
            self.nodes.get_mut(&key.id).unwrap().deletion.is_deleted = true;
        }
    }

    impl UnitOfWork for Graph {
        fn entries(&self) -> Vec<TrackedEntry> {
            self.entries.clone()
        }

        fn entity_mut(&mut self, key: &EntityKey) -> Option<&mut dyn TrackedEntity> {
            self.nodes
                .get_mut(&key.id)
                .map(|n| n as &mut dyn TrackedEntity)
        }

        fn mark_modified(&mut self, key: &EntityKey) {
            self.marked.push(*key);
        }
    }

    fn factory() -> FixedStampFactory {
        FixedStampFactory::new(AuditStamp::new(UserId::new(), Utc::now()))
    }

    #[test]
    fn test_added_and_modified_are_stamped_once() {
        let mut graph = Graph::default();
        let added = graph.add(EntityState::Added, false, vec![]);
        let modified = graph.add(EntityState::Modified, false, vec![]);
        let unchanged = graph.add(EntityState::Unchanged, false, vec![]);
        let deleted = graph.add(EntityState::Deleted, false, vec![]);
        let factory = factory();

        let report = AuditCascadeWalker::new().before_save(&mut graph, &factory);

        assert_eq!(factory.calls(), 2);
        assert_eq!(report.stamped.len(), 2);
        assert_eq!(report.stamped[0].operation, Operation::Create);
        assert_eq!(report.stamped[1].operation, Operation::Update);
        assert!(graph.node(&added).audit.created_at.is_some());
        assert!(graph.node(&modified).audit.created_at.is_none());
        assert!(graph.node(&modified).audit.modified_at.is_some());
        assert_eq!(graph.node(&unchanged).audit, AuditFields::default());
        assert_eq!(graph.node(&deleted).audit, AuditFields::default());
    }

    #[test]
    fn test_cascade_reaches_loaded_children() {
        let mut graph = Graph::default();
        let a = graph.add(EntityState::Unchanged, false, vec![]);
        let b = graph.add(EntityState::Unchanged, false, vec![]);
        let parent = graph.add(
            EntityState::Modified,
            false,
            vec![Navigation::collection("children", vec![a, b])],
        );
        graph.delete(&parent);
        let factory = factory();

        let report = AuditCascadeWalker::new().before_save(&mut graph, &factory);

        assert!(graph.node(&a).is_deleted());
        assert!(graph.node(&b).is_deleted());
        assert_eq!(report.cascaded.len(), 2);
        assert_eq!(graph.marked, vec![a, b]);
        // one update stamp for the parent plus one per cascaded child
        assert_eq!(factory.calls(), 3);
    }

    #[test]
    fn test_cascade_follows_references_too() {
        let mut graph = Graph::default();
        let target = graph.add(EntityState::Unchanged, false, vec![]);
        let parent = graph.add(
            EntityState::Modified,
            false,
            vec![Navigation::reference("owner", Some(target))],
        );
        graph.delete(&parent);

        AuditCascadeWalker::new().before_save(&mut graph, &factory());

        assert!(graph.node(&target).is_deleted());
    }

    #[test]
    fn test_unloaded_navigation_is_left_alone() {
        let mut graph = Graph::default();
        let child = graph.add(EntityState::Unchanged, false, vec![]);
        let parent = graph.add(
            EntityState::Modified,
            false,
            vec![Navigation::unloaded("children", NavigationKind::Collection)],
        );
        graph.delete(&parent);

        let report = AuditCascadeWalker::new().before_save(&mut graph, &factory());

        assert!(!graph.node(&child).is_deleted());
        assert!(report.cascaded.is_empty());
    }

    #[test]
    fn test_previously_deleted_parent_does_not_cascade() {
        let mut graph = Graph::default();
        let child = graph.add(EntityState::Unchanged, false, vec![]);
        let parent = graph.add(
            EntityState::Modified,
            true,
            vec![Navigation::collection("children", vec![child])],
        );
        graph.delete(&parent);

        AuditCascadeWalker::new().before_save(&mut graph, &factory());

        assert!(!graph.node(&child).is_deleted());
    }

    #[test]
    fn test_already_deleted_child_is_not_restamped() {
        let mut graph = Graph::default();
        let child = graph.add(EntityState::Unchanged, true, vec![]);
        graph.delete(&child);
        let parent = graph.add(
            EntityState::Modified,
            false,
            vec![Navigation::collection("children", vec![child])],
        );
        graph.delete(&parent);
        let factory = factory();

        let report = AuditCascadeWalker::new().before_save(&mut graph, &factory);

        assert!(report.cascaded.is_empty());
        assert_eq!(factory.calls(), 1);
    }

    #[test]
    fn test_shared_child_is_visited_once() {
        let mut graph = Graph::default();
        let shared = graph.add(EntityState::Unchanged, false, vec![]);
        let first = graph.add(
            EntityState::Modified,
            false,
            vec![Navigation::collection("children", vec![shared])],
        );
        let second = graph.add(
            EntityState::Modified,
            false,
            vec![Navigation::collection("children", vec![shared, first])],
        );
        graph.delete(&first);
        graph.delete(&second);
        let factory = factory();

        let report = AuditCascadeWalker::new().before_save(&mut graph, &factory);

        assert_eq!(report.cascaded.len(), 1);
        assert!(report.was_cascaded(&shared));
        assert_eq!(factory.calls(), 2 + 1);
    }

    #[test]
    fn test_cascade_is_one_level_deep() {
        let mut graph = Graph::default();
        let grandchild = graph.add(EntityState::Unchanged, false, vec![]);
        let child = graph.add(
            EntityState::Unchanged,
            false,
            vec![Navigation::collection("children", vec![grandchild])],
        );
        let parent = graph.add(
            EntityState::Modified,
            false,
            vec![Navigation::collection("children", vec![child])],
        );
        graph.delete(&parent);

        AuditCascadeWalker::new().before_save(&mut graph, &factory());

        assert!(graph.node(&child).is_deleted());
        assert!(!graph.node(&grandchild).is_deleted());
    }

    #[test]
    fn test_modified_child_cascaded_in_same_cycle_stays_one_level() {
        let mut graph = Graph::default();
        let grandchild = graph.add(EntityState::Unchanged, false, vec![]);
        let child_key = EntityKey::new("Node", Uuid::new_v4());
        let parent = graph.add(
            EntityState::Modified,
            false,
            vec![Navigation::collection("children", vec![child_key])],
        );
        // the child is edited in the same cycle and tracked after its parent
        graph.nodes.insert(
            child_key.id,
            Node {
                id: child_key.id,
                ..Node::default()
            },
        );
        graph.entries.push(TrackedEntry {
            key: child_key,
            state: EntityState::Modified,
            was_deleted: false,
            navigations: vec![Navigation::collection("children", vec![grandchild])],
        });
        graph.delete(&parent);
        let factory = factory();

        let report = AuditCascadeWalker::new().before_save(&mut graph, &factory);

        assert!(graph.node(&child_key).is_deleted());
        assert!(!graph.node(&grandchild).is_deleted());
        assert_eq!(report.cascaded.len(), 1);
        assert!(report.was_cascaded(&child_key));
        // two update stamps plus one cascade
        assert_eq!(factory.calls(), 3);
    }
}
