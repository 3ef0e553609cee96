//! Repository for the `patrimoni.actius` table.

use patrimoni_core::sync::{AssetRecord, SnapshotEntity};
use sqlx::{PgConnection, PgPool};

use crate::models::asset::{Asset, AssetDetail};
use crate::repositories::DoorRepo;

/// Column list for `actius` queries.
const COLUMNS: &str = "guid, tipus, subtipus, ubicacio, created_at, updated_at";

/// Provides queries for assets.
pub struct AssetRepo;

impl AssetRepo {
    /// Insert or update the root row of an asset.
    ///
    /// Records without an identifier are ignored and return `None`.
    pub async fn upsert(
        conn: &mut PgConnection,
        record: &AssetRecord,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let Some(guid) = record.key() else {
            return Ok(None);
        };
        let query = format!(
            "INSERT INTO patrimoni.actius (guid, tipus, subtipus, ubicacio) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (guid) DO UPDATE SET \
                tipus = EXCLUDED.tipus, \
                subtipus = EXCLUDED.subtipus, \
                ubicacio = EXCLUDED.ubicacio, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(guid)
            .bind(record.tipus.as_deref())
            .bind(record.subtipus.as_deref())
            .bind(record.ubicacio.as_deref())
            .fetch_one(&mut *conn)
            .await
            .map(Some)
    }

    /// Find an asset by its identifier.
    pub async fn find_by_guid(pool: &PgPool, guid: &str) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM patrimoni.actius WHERE guid = $1");
        sqlx::query_as::<_, Asset>(&query)
            .bind(guid)
            .fetch_optional(pool)
            .await
    }

    /// Find an asset together with its door and fire-door rows.
    pub async fn find_detail(pool: &PgPool, guid: &str) -> Result<Option<AssetDetail>, sqlx::Error> {
        let Some(asset) = Self::find_by_guid(pool, guid).await? else {
            return Ok(None);
        };
        let door = DoorRepo::find_door(pool, guid).await?;
        let fire_door = match door {
            Some(_) => DoorRepo::find_fire_door(pool, guid).await?,
            None => None,
        };
        Ok(Some(AssetDetail {
            asset,
            door,
            fire_door,
        }))
    }

    /// List the assets of one building, ordered by location.
    pub async fn list_by_building(pool: &PgPool, building: &str) -> Result<Vec<Asset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM patrimoni.actius \
             WHERE LEFT(ubicacio, 3) = $1 \
             ORDER BY ubicacio, guid"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(building)
            .fetch_all(pool)
            .await
    }

    /// Rows a snapshot is reconciled against: every asset of the given
    /// buildings plus any asset whose identifier is listed.
    pub async fn list_for_reconciliation(
        conn: &mut PgConnection,
        buildings: &[String],
        guids: &[String],
    ) -> Result<Vec<Asset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM patrimoni.actius \
             WHERE LEFT(ubicacio, 3) = ANY($1) OR guid = ANY($2) \
             ORDER BY guid"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(buildings)
            .bind(guids)
            .fetch_all(&mut *conn)
            .await
    }

    /// Delete the listed assets of one building. Door and fire-door rows go
    /// with them through the foreign key cascade.
    ///
    /// Assets that have since moved to another building are left alone.
    pub async fn delete_in_building(
        conn: &mut PgConnection,
        building: &str,
        guids: &[String],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM patrimoni.actius WHERE LEFT(ubicacio, 3) = $1 AND guid = ANY($2)",
        )
        .bind(building)
        .bind(guids)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }
}
