//! Asset rows and their door / fire-door extensions.

use patrimoni_core::sync::AssetState;
use patrimoni_core::types::{Guid, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `patrimoni.actius` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Asset {
    pub guid: Guid,
    pub tipus: Option<String>,
    pub subtipus: Option<String>,
    pub ubicacio: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `patrimoni.ifcdoor` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Door {
    pub actiu_id: Guid,
    pub from_room: Option<String>,
    pub to_room: Option<String>,
}

/// A row from the `patrimoni.ifcdoor_fire` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FireDoor {
    pub actiu_id: Guid,
    pub numero: Option<String>,
}

/// An asset joined with whatever extensions it has.
#[derive(Debug, Clone, Serialize)]
pub struct AssetDetail {
    #[serde(flatten)]
    pub asset: Asset,
    pub door: Option<Door>,
    pub fire_door: Option<FireDoor>,
}

impl From<Asset> for AssetState {
    fn from(row: Asset) -> Self {
        Self {
            guid: row.guid,
            tipus: row.tipus,
            subtipus: row.subtipus,
            ubicacio: row.ubicacio,
        }
    }
}
