//! Bulk synchronization of BIM snapshots against the registry.
//!
//! A request body is parsed into a [`SyncRequest`], compared with persisted
//! rows into a [`Reconciliation`], and [`SyncDecision::decide`] picks whether
//! the result is written, proposed or dropped. Writing is the db crate's job.

pub mod classify;
pub mod coerce;
pub mod plan;
pub mod reconcile;
pub mod records;
pub mod snapshot;

pub use classify::AssetKind;
pub use plan::{AppliedChanges, SyncDecision, SyncMode};
pub use reconcile::{Reconciliation, ReconciliationSummary, SUMMARY_SAMPLE_SIZE};
pub use records::{AssetRecord, AssetState, SnapshotEntity, SpaceRecord, SpaceState};
pub use snapshot::{SkipReason, SkippedRecord, SyncRequest};
