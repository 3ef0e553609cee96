//! Space (room) rows.

use patrimoni_core::sync::SpaceState;
use patrimoni_core::types::{Guid, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `patrimoni.ifcspace` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Space {
    pub guid: Guid,
    pub codi: Option<String>,
    pub edifici: Option<String>,
    pub planta: Option<String>,
    pub dispositiu: Option<String>,
    pub departament: Option<String>,
    pub id_intern: Option<String>,
    pub centre_cost: Option<String>,
    pub area: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Space> for SpaceState {
    fn from(row: Space) -> Self {
        Self {
            guid: row.guid,
            codi: row.codi,
            edifici: row.edifici,
            planta: row.planta,
            dispositiu: row.dispositiu,
            departament: row.departament,
            id_intern: row.id_intern,
            centre_cost: row.centre_cost,
            area: row.area,
        }
    }
}
