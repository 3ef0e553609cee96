//! Applies reconciled snapshots to the registry.
//!
//! A sync reads the stored rows, reconciles and writes inside a single
//! transaction, so a failure anywhere leaves the registry untouched.

use std::collections::BTreeSet;

use async_trait::async_trait;
use patrimoni_core::sync::{
    AppliedChanges, AssetRecord, Reconciliation, SnapshotEntity, SpaceRecord, SyncDecision,
    SyncMode, SyncRequest,
};
use sqlx::{PgConnection, PgPool};

use crate::repositories::{AssetRepo, DoorRepo, SpaceRepo};

/// A snapshot record type the registry knows how to load, write and delete.
#[async_trait]
pub trait SyncTarget: SnapshotEntity {
    /// Mode used when the request does not name one.
    const DEFAULT_MODE: SyncMode;

    /// Whether deletions run before the upserts on commit.
    const DELETE_FIRST: bool;

    async fn load_persisted(
        conn: &mut PgConnection,
        buildings: &[String],
        keys: &[String],
    ) -> Result<Vec<Self::State>, sqlx::Error>;

    async fn write(
        conn: &mut PgConnection,
        record: &Self,
        applied: &mut AppliedChanges,
    ) -> Result<(), sqlx::Error>;

    async fn delete_in_building(
        conn: &mut PgConnection,
        building: &str,
        keys: &[String],
    ) -> Result<u64, sqlx::Error>;
}

#[async_trait]
impl SyncTarget for AssetRecord {
    const DEFAULT_MODE: SyncMode = SyncMode::AutoCommit;
    const DELETE_FIRST: bool = false;

    async fn load_persisted(
        conn: &mut PgConnection,
        buildings: &[String],
        keys: &[String],
    ) -> Result<Vec<Self::State>, sqlx::Error> {
        let rows = AssetRepo::list_for_reconciliation(conn, buildings, keys).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Root row, then the door row, then the fire-door row, as far as the
    /// record's classification goes.
    async fn write(
        conn: &mut PgConnection,
        record: &Self,
        applied: &mut AppliedChanges,
    ) -> Result<(), sqlx::Error> {
        let Some(asset) = AssetRepo::upsert(conn, record).await? else {
            return Ok(());
        };
        applied.upserted += 1;

        let kind = record.kind();
        if kind.has_door() {
            DoorRepo::upsert_door(
                conn,
                &asset.guid,
                record.from_room.as_deref(),
                record.to_room.as_deref(),
            )
            .await?;
            applied.doors += 1;
        }
        if kind.has_fire_door() {
            DoorRepo::upsert_fire_door(conn, &asset.guid, record.marca.as_deref()).await?;
            applied.fire_doors += 1;
        }
        Ok(())
    }

    async fn delete_in_building(
        conn: &mut PgConnection,
        building: &str,
        keys: &[String],
    ) -> Result<u64, sqlx::Error> {
        AssetRepo::delete_in_building(conn, building, keys).await
    }
}

#[async_trait]
impl SyncTarget for SpaceRecord {
    const DEFAULT_MODE: SyncMode = SyncMode::PreviewThenCommit;
    const DELETE_FIRST: bool = true;

    async fn load_persisted(
        conn: &mut PgConnection,
        buildings: &[String],
        keys: &[String],
    ) -> Result<Vec<Self::State>, sqlx::Error> {
        let rows = SpaceRepo::list_for_reconciliation(conn, buildings, keys).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn write(
        conn: &mut PgConnection,
        record: &Self,
        applied: &mut AppliedChanges,
    ) -> Result<(), sqlx::Error> {
        if SpaceRepo::upsert(conn, record).await?.is_some() {
            applied.upserted += 1;
        }
        Ok(())
    }

    async fn delete_in_building(
        conn: &mut PgConnection,
        building: &str,
        keys: &[String],
    ) -> Result<u64, sqlx::Error> {
        SpaceRepo::delete_in_building(conn, building, keys).await
    }
}

/// Result of [`SyncRepo::sync`].
#[derive(Debug)]
pub struct SyncOutcome<T> {
    pub mode: SyncMode,
    pub decision: SyncDecision,
    pub reconciliation: Reconciliation<T>,
    /// Present only when the decision was to commit.
    pub applied: Option<AppliedChanges>,
}

/// Runs reconciliations and commits them.
pub struct SyncRepo;

impl SyncRepo {
    /// Reconcile without writing anything.
    pub async fn preview<T: SyncTarget>(
        pool: &PgPool,
        request: SyncRequest<T>,
    ) -> Result<Reconciliation<T>, sqlx::Error> {
        let (buildings, keys) = scope(&request);
        let mut conn = pool.acquire().await?;
        let persisted = T::load_persisted(&mut *conn, &buildings, &keys).await?;
        let reconciliation = Reconciliation::compute(request, persisted);
        log_skipped(&reconciliation);
        Ok(reconciliation)
    }

    /// Reconcile and, if the confirmation gate allows it, apply the result.
    pub async fn sync<T: SyncTarget>(
        pool: &PgPool,
        request: SyncRequest<T>,
    ) -> Result<SyncOutcome<T>, sqlx::Error> {
        let mode = request.mode.unwrap_or(T::DEFAULT_MODE);
        let confirm_delete = request.confirm_delete;
        let (buildings, keys) = scope(&request);

        let mut tx = pool.begin().await?;
        let persisted = T::load_persisted(&mut *tx, &buildings, &keys).await?;
        let reconciliation = Reconciliation::compute(request, persisted);
        log_skipped(&reconciliation);

        let decision = SyncDecision::decide(mode, confirm_delete, reconciliation.has_deletions());
        if !decision.writes() {
            tx.rollback().await?;
            tracing::info!(
                entity = T::ENTITY,
                mode = mode.as_str(),
                status = decision.status(),
                pending_deletions = reconciliation.deleted_keys().count(),
                "Sync not applied",
            );
            return Ok(SyncOutcome {
                mode,
                decision,
                reconciliation,
                applied: None,
            });
        }

        let mut applied = AppliedChanges::default();
        if T::DELETE_FIRST {
            applied.deleted = delete_all(&mut *tx, &reconciliation).await?;
        }
        for record in &reconciliation.upserts {
            T::write(&mut *tx, record, &mut applied).await?;
        }
        if !T::DELETE_FIRST {
            applied.deleted = delete_all(&mut *tx, &reconciliation).await?;
        }
        tx.commit().await?;

        tracing::info!(
            entity = T::ENTITY,
            mode = mode.as_str(),
            buildings = ?reconciliation.partition_keys(),
            upserted = applied.upserted,
            doors = applied.doors,
            fire_doors = applied.fire_doors,
            deleted = applied.deleted,
            skipped = reconciliation.skipped.len(),
            "Sync committed",
        );

        Ok(SyncOutcome {
            mode,
            decision,
            reconciliation,
            applied: Some(applied),
        })
    }
}

/// Buildings and identifiers named by the request's records.
fn scope<T: SnapshotEntity>(request: &SyncRequest<T>) -> (Vec<String>, Vec<String>) {
    let mut buildings = BTreeSet::new();
    let mut keys = BTreeSet::new();
    for entry in &request.entries {
        if let (Some(key), Some(building)) = (entry.record.key(), entry.record.partition()) {
            keys.insert(key.to_owned());
            buildings.insert(building);
        }
    }
    (buildings.into_iter().collect(), keys.into_iter().collect())
}

async fn delete_all<T: SyncTarget>(
    conn: &mut PgConnection,
    reconciliation: &Reconciliation<T>,
) -> Result<u64, sqlx::Error> {
    let mut deleted = 0;
    for (building, keys) in reconciliation.deletions_by_partition() {
        deleted += T::delete_in_building(conn, &building, &keys).await?;
    }
    Ok(deleted)
}

fn log_skipped<T: SnapshotEntity>(reconciliation: &Reconciliation<T>) {
    for skipped in &reconciliation.skipped {
        tracing::warn!(
            entity = T::ENTITY,
            index = skipped.index,
            reason = %skipped.reason,
            "Skipping snapshot record",
        );
    }
    if !reconciliation.duplicate_keys.is_empty() {
        tracing::warn!(
            entity = T::ENTITY,
            keys = ?reconciliation.duplicate_keys,
            "Duplicate keys in snapshot, last occurrence kept",
        );
    }
}
