//! Repository for the door extension tables (`ifcdoor`, `ifcdoor_fire`).

use sqlx::{PgConnection, PgPool};

use crate::models::asset::{Door, FireDoor};

/// Column list for `ifcdoor` queries.
const DOOR_COLUMNS: &str = "actiu_id, from_room, to_room";

/// Column list for `ifcdoor_fire` queries.
const FIRE_DOOR_COLUMNS: &str = "actiu_id, numero";

/// Provides queries for door and fire-door rows.
pub struct DoorRepo;

impl DoorRepo {
    /// Insert or update the door row of an asset. A `None` room keeps the
    /// stored value.
    pub async fn upsert_door(
        conn: &mut PgConnection,
        actiu_id: &str,
        from_room: Option<&str>,
        to_room: Option<&str>,
    ) -> Result<Door, sqlx::Error> {
        let query = format!(
            "INSERT INTO patrimoni.ifcdoor (actiu_id, from_room, to_room) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (actiu_id) DO UPDATE SET \
                from_room = COALESCE(EXCLUDED.from_room, ifcdoor.from_room), \
                to_room = COALESCE(EXCLUDED.to_room, ifcdoor.to_room) \
             RETURNING {DOOR_COLUMNS}"
        );
        sqlx::query_as::<_, Door>(&query)
            .bind(actiu_id)
            .bind(from_room)
            .bind(to_room)
            .fetch_one(&mut *conn)
            .await
    }

    /// Insert or update the fire-door row of a door. A `None` label keeps
    /// the stored value.
    pub async fn upsert_fire_door(
        conn: &mut PgConnection,
        actiu_id: &str,
        numero: Option<&str>,
    ) -> Result<FireDoor, sqlx::Error> {
        let query = format!(
            "INSERT INTO patrimoni.ifcdoor_fire (actiu_id, numero) \
             VALUES ($1, $2) \
             ON CONFLICT (actiu_id) DO UPDATE SET \
                numero = COALESCE(EXCLUDED.numero, ifcdoor_fire.numero) \
             RETURNING {FIRE_DOOR_COLUMNS}"
        );
        sqlx::query_as::<_, FireDoor>(&query)
            .bind(actiu_id)
            .bind(numero)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn find_door(pool: &PgPool, actiu_id: &str) -> Result<Option<Door>, sqlx::Error> {
        let query = format!("SELECT {DOOR_COLUMNS} FROM patrimoni.ifcdoor WHERE actiu_id = $1");
        sqlx::query_as::<_, Door>(&query)
            .bind(actiu_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_fire_door(
        pool: &PgPool,
        actiu_id: &str,
    ) -> Result<Option<FireDoor>, sqlx::Error> {
        let query =
            format!("SELECT {FIRE_DOOR_COLUMNS} FROM patrimoni.ifcdoor_fire WHERE actiu_id = $1");
        sqlx::query_as::<_, FireDoor>(&query)
            .bind(actiu_id)
            .fetch_optional(pool)
            .await
    }
}
