//! Audit stamping and soft-delete cascading at the persistence boundary
//!
//! # Architecture
//!
//! - `AuditStamp` / `AuditStampFactory`: who did a write and when, supplied by
//!   the caller at save time.
//! - `Auditable` / `SoftDeletable`: capabilities an entity implements to
//!   receive stamps and to be flagged deleted.
//! - `UnitOfWork`: the change-tracking view a persistence session exposes
//!   (entity, state, loaded navigations).
//! - `AuditCascadeWalker`: walks a unit of work once per save cycle, stamping
//!   and cascading soft deletes.
//! - `AuditJournal`: an append-only JSONL record of every save cycle.
//!
//! # Example
//!
//! ```rust,ignore
//! use budget_core::audit::{AuditCascadeWalker, SystemStampFactory};
//!
//! let factory = SystemStampFactory::new(actor_id);
//! let report = AuditCascadeWalker::new().before_save(&mut session, &factory);
//! journal.record(&report)?;
//! ```

mod cascade;
mod diff;
mod fields;
mod journal;
mod record;
mod stamp;
mod tracking;

pub use cascade::{AuditCascadeWalker, ReportEntry, SaveCycleReport};
pub use diff::generate_diff;
pub use fields::{AuditFields, AuditOperation, Auditable, SoftDeletable, SoftDeleteFields};
pub use journal::AuditJournal;
pub use record::{AuditRecord, Operation};
pub use stamp::{AuditStamp, AuditStampFactory, FixedStampFactory, SystemStampFactory};
pub use tracking::{
    EntityKey, EntityState, Navigation, NavigationKind, TrackedEntity, TrackedEntry, UnitOfWork,
};
