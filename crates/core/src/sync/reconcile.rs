//! Snapshot-vs-persisted reconciliation.
//!
//! Incoming records are grouped by building. Inside every building touched
//! by the snapshot, each valid key lands in exactly one of new, modified,
//! unchanged or deleted.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use super::records::{PersistedEntity, SnapshotEntity};
use super::snapshot::{SkipReason, SkippedRecord, SyncRequest};

/// Maximum number of keys listed per category in a summary.
pub const SUMMARY_SAMPLE_SIZE: usize = 20;

/// Differences for one building.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartitionDiff {
    pub partition: String,
    pub new: Vec<String>,
    pub modified: Vec<String>,
    pub unchanged: Vec<String>,
    pub deleted: Vec<String>,
}

/// Outcome of comparing a snapshot with persisted state.
#[derive(Debug, Clone)]
pub struct Reconciliation<T> {
    pub partitions: BTreeMap<String, PartitionDiff>,
    /// Valid records to upsert, deduplicated by key, in snapshot order.
    pub upserts: Vec<T>,
    pub skipped: Vec<SkippedRecord>,
    /// Keys that appeared more than once; the last occurrence is kept.
    pub duplicate_keys: Vec<String>,
    /// Elements in the request body, valid or not.
    pub total_records: usize,
}

impl<T: SnapshotEntity> Reconciliation<T> {
    /// Compare `request` with `persisted`.
    ///
    /// `persisted` should hold every stored row of the snapshot's buildings
    /// plus any stored row whose key appears in the snapshot. Rows of other
    /// buildings are only used to recognise moved records and are never
    /// reported as deleted.
    pub fn compute(request: SyncRequest<T>, persisted: Vec<T::State>) -> Self {
        let total_records = request.total_records();
        let mut skipped = request.malformed;
        let mut upserts: Vec<T> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut duplicate_keys: Vec<String> = Vec::new();

        for entry in request.entries {
            let Some(key) = entry.record.key().map(str::to_owned) else {
                skipped.push(SkippedRecord {
                    index: entry.index,
                    reason: SkipReason::MissingKey,
                });
                continue;
            };
            if entry.record.partition().is_none() {
                skipped.push(SkippedRecord {
                    index: entry.index,
                    reason: SkipReason::MissingPartition,
                });
                continue;
            }
            match positions.get(&key) {
                Some(&pos) => {
                    if !duplicate_keys.contains(&key) {
                        duplicate_keys.push(key);
                    }
                    upserts[pos] = entry.record;
                }
                None => {
                    positions.insert(key, upserts.len());
                    upserts.push(entry.record);
                }
            }
        }
        skipped.sort_by_key(|s| s.index);

        let stored: HashMap<&str, &T::State> = persisted.iter().map(|p| (p.key(), p)).collect();
        let mut partitions: BTreeMap<String, PartitionDiff> = BTreeMap::new();

        for record in &upserts {
            let (Some(key), Some(partition)) = (record.key(), record.partition()) else {
                continue;
            };
            let diff = partitions
                .entry(partition.clone())
                .or_insert_with(|| PartitionDiff {
                    partition,
                    ..Default::default()
                });
            match stored.get(key) {
                None => diff.new.push(key.to_owned()),
                Some(state) if record.differs_from(state) => diff.modified.push(key.to_owned()),
                Some(_) => diff.unchanged.push(key.to_owned()),
            }
        }

        let incoming: BTreeSet<&str> = positions.keys().map(String::as_str).collect();
        for state in &persisted {
            if incoming.contains(state.key()) {
                continue;
            }
            let Some(partition) = state.partition() else {
                continue;
            };
            if let Some(diff) = partitions.get_mut(&partition) {
                diff.deleted.push(state.key().to_owned());
            }
        }
        for diff in partitions.values_mut() {
            diff.deleted.sort();
        }

        Self {
            partitions,
            upserts,
            skipped,
            duplicate_keys,
            total_records,
        }
    }

    /// Buildings touched by the snapshot.
    pub fn partition_keys(&self) -> Vec<String> {
        self.partitions.keys().cloned().collect()
    }

    pub fn has_deletions(&self) -> bool {
        self.partitions.values().any(|d| !d.deleted.is_empty())
    }

    /// Keys to delete, grouped by building.
    pub fn deletions_by_partition(&self) -> Vec<(String, Vec<String>)> {
        self.partitions
            .values()
            .filter(|d| !d.deleted.is_empty())
            .map(|d| (d.partition.clone(), d.deleted.clone()))
            .collect()
    }

    pub fn new_keys(&self) -> impl Iterator<Item = &str> {
        self.partitions.values().flat_map(|d| d.new.iter().map(String::as_str))
    }

    pub fn modified_keys(&self) -> impl Iterator<Item = &str> {
        self.partitions
            .values()
            .flat_map(|d| d.modified.iter().map(String::as_str))
    }

    pub fn deleted_keys(&self) -> impl Iterator<Item = &str> {
        self.partitions
            .values()
            .flat_map(|d| d.deleted.iter().map(String::as_str))
    }

    /// Counts plus key lists. Lists are capped at [`SUMMARY_SAMPLE_SIZE`]
    /// unless `full` is set.
    pub fn summary(&self, full: bool) -> ReconciliationSummary {
        let limit = if full { usize::MAX } else { SUMMARY_SAMPLE_SIZE };
        let sample = |keys: Vec<&str>| -> (usize, Vec<String>) {
            let count = keys.len();
            (count, keys.into_iter().take(limit).map(str::to_owned).collect())
        };

        let (new_count, new) = sample(self.new_keys().collect());
        let (modified_count, modified) = sample(self.modified_keys().collect());
        let (deleted_count, deleted) = sample(self.deleted_keys().collect());
        let unchanged_count = self.partitions.values().map(|d| d.unchanged.len()).sum();
        let skipped: Vec<SkippedRecord> = self.skipped.iter().take(limit).cloned().collect();

        let truncated = !full
            && [new_count, modified_count, deleted_count, self.skipped.len()]
                .iter()
                .any(|&n| n > SUMMARY_SAMPLE_SIZE);

        ReconciliationSummary {
            entity: T::ENTITY,
            total_records: self.total_records,
            valid_records: self.upserts.len(),
            new_count,
            modified_count,
            unchanged_count,
            deleted_count,
            skipped_count: self.skipped.len(),
            new,
            modified,
            deleted,
            skipped,
            duplicate_keys: self.duplicate_keys.clone(),
            partitions: self
                .partitions
                .values()
                .map(|d| PartitionCounts {
                    partition: d.partition.clone(),
                    new: d.new.len(),
                    modified: d.modified.len(),
                    unchanged: d.unchanged.len(),
                    deleted: d.deleted.len(),
                })
                .collect(),
            truncated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionCounts {
    pub partition: String,
    pub new: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub deleted: usize,
}

/// Serializable view of a [`Reconciliation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationSummary {
    pub entity: &'static str,
    pub total_records: usize,
    pub valid_records: usize,
    pub new_count: usize,
    pub modified_count: usize,
    pub unchanged_count: usize,
    pub deleted_count: usize,
    pub skipped_count: usize,
    pub new: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    pub skipped: Vec<SkippedRecord>,
    pub duplicate_keys: Vec<String>,
    pub partitions: Vec<PartitionCounts>,
    /// Whether any list above was cut to the sample size.
    pub truncated: bool,
}
