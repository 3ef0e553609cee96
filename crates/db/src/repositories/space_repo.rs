//! Repository for the `patrimoni.ifcspace` table.

use patrimoni_core::sync::{SnapshotEntity, SpaceRecord};
use sqlx::{PgConnection, PgPool};

use crate::models::space::Space;

/// Column list for `ifcspace` queries.
const COLUMNS: &str = "\
    guid, codi, edifici, planta, dispositiu, departament, \
    id_intern, centre_cost, area, created_at, updated_at";

/// Provides queries for spaces.
pub struct SpaceRepo;

impl SpaceRepo {
    /// Insert or update a space. Records without an identifier are ignored
    /// and return `None`.
    pub async fn upsert(
        conn: &mut PgConnection,
        record: &SpaceRecord,
    ) -> Result<Option<Space>, sqlx::Error> {
        let Some(guid) = record.key() else {
            return Ok(None);
        };
        let query = format!(
            "INSERT INTO patrimoni.ifcspace (\
                guid, codi, edifici, planta, dispositiu, departament, \
                id_intern, centre_cost, area\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (guid) DO UPDATE SET \
                codi = EXCLUDED.codi, \
                edifici = EXCLUDED.edifici, \
                planta = EXCLUDED.planta, \
                dispositiu = EXCLUDED.dispositiu, \
                departament = EXCLUDED.departament, \
                id_intern = EXCLUDED.id_intern, \
                centre_cost = EXCLUDED.centre_cost, \
                area = EXCLUDED.area, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Space>(&query)
            .bind(guid)
            .bind(record.codi.as_deref())
            .bind(record.edifici.as_deref())
            .bind(record.planta.as_deref())
            .bind(record.dispositiu.as_deref())
            .bind(record.departament.as_deref())
            .bind(record.id_intern.as_deref())
            .bind(record.centre_cost.as_deref())
            .bind(record.area)
            .fetch_one(&mut *conn)
            .await
            .map(Some)
    }

    pub async fn find_by_guid(pool: &PgPool, guid: &str) -> Result<Option<Space>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM patrimoni.ifcspace WHERE guid = $1");
        sqlx::query_as::<_, Space>(&query)
            .bind(guid)
            .fetch_optional(pool)
            .await
    }

    /// List the spaces of one building, ordered by floor and code.
    pub async fn list_by_building(pool: &PgPool, building: &str) -> Result<Vec<Space>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM patrimoni.ifcspace \
             WHERE edifici = $1 \
             ORDER BY planta NULLS LAST, codi NULLS LAST, guid"
        );
        sqlx::query_as::<_, Space>(&query)
            .bind(building)
            .fetch_all(pool)
            .await
    }

    /// Rows a snapshot is reconciled against: every space of the given
    /// buildings plus any space whose identifier is listed.
    pub async fn list_for_reconciliation(
        conn: &mut PgConnection,
        buildings: &[String],
        guids: &[String],
    ) -> Result<Vec<Space>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM patrimoni.ifcspace \
             WHERE edifici = ANY($1) OR guid = ANY($2) \
             ORDER BY guid"
        );
        sqlx::query_as::<_, Space>(&query)
            .bind(buildings)
            .bind(guids)
            .fetch_all(&mut *conn)
            .await
    }

    /// Delete the listed spaces of one building.
    pub async fn delete_in_building(
        conn: &mut PgConnection,
        building: &str,
        guids: &[String],
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM patrimoni.ifcspace WHERE edifici = $1 AND guid = ANY($2)")
                .bind(building)
                .bind(guids)
                .execute(&mut *conn)
                .await?;
        Ok(result.rows_affected())
    }
}
