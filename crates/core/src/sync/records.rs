//! Incoming snapshot records and the persisted state they are compared to.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::classify::AssetKind;
use super::coerce::{opt_number, opt_text, same_text};

/// Width of the building code at the start of an asset location
/// (`BBB-FFF-SSS`).
pub const BUILDING_CODE_LEN: usize = 3;

/// Space areas are equal when they agree to this many decimal places.
pub const AREA_DECIMALS: i32 = 3;

/// A record type that can be reconciled against persisted rows.
pub trait SnapshotEntity: DeserializeOwned + Send + Sync {
    type State: PersistedEntity;

    /// Entity name for logs and error messages.
    const ENTITY: &'static str;

    /// Unique identifier, if the record carries one.
    fn key(&self) -> Option<&str>;

    /// Building the record belongs to, if it can be determined.
    fn partition(&self) -> Option<String>;

    /// Whether any tracked field differs from the stored state.
    fn differs_from(&self, state: &Self::State) -> bool;

    /// Fill every absent field from `defaults`. Keys are never defaulted.
    fn with_defaults(self, defaults: &Self) -> Self;
}

/// The tracked projection of a stored row.
pub trait PersistedEntity: Send + Sync {
    fn key(&self) -> &str;
    fn partition(&self) -> Option<String>;
}

/// Building code of an asset location: its first three characters.
pub fn location_partition(ubicacio: &str) -> Option<String> {
    let trimmed = ubicacio.trim();
    if trimmed.chars().count() < BUILDING_CODE_LEN {
        return None;
    }
    Some(trimmed.chars().take(BUILDING_CODE_LEN).collect())
}

fn round_area(area: f64) -> i64 {
    (area * 10f64.powi(AREA_DECIMALS)).round() as i64
}

/// Areas compared after rounding to [`AREA_DECIMALS`].
pub fn same_area(stored: Option<f64>, incoming: Option<f64>) -> bool {
    match (stored, incoming) {
        (None, None) => true,
        (Some(a), Some(b)) => round_area(a) == round_area(b),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// One asset of an incoming snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AssetRecord {
    #[serde(default, deserialize_with = "opt_text")]
    pub guid: Option<String>,
    /// Fallback identifier used when `guid` is absent.
    #[serde(default, rename = "GlobalId", alias = "global_id", deserialize_with = "opt_text")]
    pub global_id: Option<String>,
    #[serde(default, rename = "type", alias = "tipus", deserialize_with = "opt_text")]
    pub tipus: Option<String>,
    #[serde(default, rename = "subtype", alias = "subtipus", deserialize_with = "opt_text")]
    pub subtipus: Option<String>,
    #[serde(default, rename = "location", alias = "ubicacio", deserialize_with = "opt_text")]
    pub ubicacio: Option<String>,
    #[serde(default, alias = "fromRoom", deserialize_with = "opt_text")]
    pub from_room: Option<String>,
    #[serde(default, alias = "toRoom", deserialize_with = "opt_text")]
    pub to_room: Option<String>,
    /// Fire-door label, stored as `ifcdoor_fire.numero`.
    #[serde(default, alias = "numero", deserialize_with = "opt_text")]
    pub marca: Option<String>,
}

impl AssetRecord {
    pub fn kind(&self) -> AssetKind {
        AssetKind::classify(self.tipus.as_deref(), self.subtipus.as_deref())
    }
}

/// Tracked fields of a stored `actius` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetState {
    pub guid: String,
    pub tipus: Option<String>,
    pub subtipus: Option<String>,
    pub ubicacio: Option<String>,
}

impl PersistedEntity for AssetState {
    fn key(&self) -> &str {
        &self.guid
    }

    fn partition(&self) -> Option<String> {
        self.ubicacio.as_deref().and_then(location_partition)
    }
}

impl SnapshotEntity for AssetRecord {
    type State = AssetState;
    const ENTITY: &'static str = "Asset";

    fn key(&self) -> Option<&str> {
        self.guid.as_deref().or(self.global_id.as_deref())
    }

    fn partition(&self) -> Option<String> {
        self.ubicacio.as_deref().and_then(location_partition)
    }

    fn differs_from(&self, state: &AssetState) -> bool {
        !(same_text(state.tipus.as_deref(), self.tipus.as_deref())
            && same_text(state.subtipus.as_deref(), self.subtipus.as_deref())
            && same_text(state.ubicacio.as_deref(), self.ubicacio.as_deref()))
    }

    fn with_defaults(self, defaults: &Self) -> Self {
        Self {
            guid: self.guid,
            global_id: self.global_id,
            tipus: self.tipus.or_else(|| defaults.tipus.clone()),
            subtipus: self.subtipus.or_else(|| defaults.subtipus.clone()),
            ubicacio: self.ubicacio.or_else(|| defaults.ubicacio.clone()),
            from_room: self.from_room.or_else(|| defaults.from_room.clone()),
            to_room: self.to_room.or_else(|| defaults.to_room.clone()),
            marca: self.marca.or_else(|| defaults.marca.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Spaces
// ---------------------------------------------------------------------------

/// One space (room) of an incoming snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SpaceRecord {
    #[serde(default, alias = "GlobalId", alias = "global_id", deserialize_with = "opt_text")]
    pub guid: Option<String>,
    #[serde(default, rename = "code", alias = "codi", deserialize_with = "opt_text")]
    pub codi: Option<String>,
    #[serde(default, rename = "building", alias = "edifici", deserialize_with = "opt_text")]
    pub edifici: Option<String>,
    #[serde(default, rename = "floor", alias = "planta", deserialize_with = "opt_text")]
    pub planta: Option<String>,
    #[serde(
        default,
        rename = "device",
        alias = "dispositiu",
        alias = "usage",
        deserialize_with = "opt_text"
    )]
    pub dispositiu: Option<String>,
    #[serde(default, rename = "department", alias = "departament", deserialize_with = "opt_text")]
    pub departament: Option<String>,
    #[serde(
        default,
        rename = "internal_id",
        alias = "id_intern",
        alias = "id",
        deserialize_with = "opt_text"
    )]
    pub id_intern: Option<String>,
    #[serde(default, rename = "cost_center", alias = "centre_cost", deserialize_with = "opt_text")]
    pub centre_cost: Option<String>,
    #[serde(default, deserialize_with = "opt_number")]
    pub area: Option<f64>,
}

/// Tracked fields of a stored `ifcspace` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpaceState {
    pub guid: String,
    pub codi: Option<String>,
    pub edifici: Option<String>,
    pub planta: Option<String>,
    pub dispositiu: Option<String>,
    pub departament: Option<String>,
    pub id_intern: Option<String>,
    pub centre_cost: Option<String>,
    pub area: Option<f64>,
}

impl PersistedEntity for SpaceState {
    fn key(&self) -> &str {
        &self.guid
    }

    fn partition(&self) -> Option<String> {
        self.edifici.clone()
    }
}

impl SnapshotEntity for SpaceRecord {
    type State = SpaceState;
    const ENTITY: &'static str = "Space";

    fn key(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    fn partition(&self) -> Option<String> {
        self.edifici.clone()
    }

    fn differs_from(&self, state: &SpaceState) -> bool {
        !(same_text(state.codi.as_deref(), self.codi.as_deref())
            && same_text(state.planta.as_deref(), self.planta.as_deref())
            && same_text(state.dispositiu.as_deref(), self.dispositiu.as_deref())
            && same_text(state.departament.as_deref(), self.departament.as_deref())
            && same_text(state.id_intern.as_deref(), self.id_intern.as_deref())
            && same_text(state.centre_cost.as_deref(), self.centre_cost.as_deref())
            && same_area(state.area, self.area))
    }

    fn with_defaults(self, defaults: &Self) -> Self {
        Self {
            guid: self.guid,
            codi: self.codi.or_else(|| defaults.codi.clone()),
            edifici: self.edifici.or_else(|| defaults.edifici.clone()),
            planta: self.planta.or_else(|| defaults.planta.clone()),
            dispositiu: self.dispositiu.or_else(|| defaults.dispositiu.clone()),
            departament: self.departament.or_else(|| defaults.departament.clone()),
            id_intern: self.id_intern.or_else(|| defaults.id_intern.clone()),
            centre_cost: self.centre_cost.or_else(|| defaults.centre_cost.clone()),
            area: self.area.or(defaults.area),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn space_state(guid: &str, area: Option<f64>) -> SpaceState {
        SpaceState {
            guid: guid.to_string(),
            codi: Some("A-01".to_string()),
            edifici: Some("CQA".to_string()),
            planta: Some("P00".to_string()),
            dispositiu: None,
            departament: None,
            id_intern: None,
            centre_cost: None,
            area,
        }
    }

    fn space_record(guid: &str, area: serde_json::Value) -> SpaceRecord {
        serde_json::from_value(json!({
            "guid": guid,
            "code": "A-01",
            "building": "CQA",
            "floor": "P00",
            "area": area,
        }))
        .unwrap()
    }

    #[test]
    fn asset_record_accepts_english_and_catalan_names() {
        let english: AssetRecord = serde_json::from_value(json!({
            "guid": "G1", "type": "IFCDOOR", "subtype": "PortaTallafoc",
            "location": "CQA-P00-001", "marca": "F12"
        }))
        .unwrap();
        let catalan: AssetRecord = serde_json::from_value(json!({
            "guid": "G1", "tipus": "IFCDOOR", "subtipus": "PortaTallafoc",
            "ubicacio": "CQA-P00-001", "numero": "F12"
        }))
        .unwrap();
        assert_eq!(english, catalan);
        assert_eq!(english.kind(), AssetKind::FireDoor);
    }

    #[test]
    fn asset_key_falls_back_to_global_id() {
        let record: AssetRecord = serde_json::from_value(json!({"GlobalId": "X9"})).unwrap();
        assert_eq!(record.key(), Some("X9"));
        let none: AssetRecord = serde_json::from_value(json!({"guid": " "})).unwrap();
        assert_eq!(none.key(), None);
    }

    #[test]
    fn asset_partition_is_the_location_prefix() {
        assert_eq!(location_partition("CQA-P00-001"), Some("CQA".to_string()));
        assert_eq!(location_partition("CQ"), None);
        assert_eq!(location_partition(" CQB"), Some("CQB".to_string()));
    }

    #[test]
    fn numeric_label_is_coerced_to_text() {
        let record: AssetRecord = serde_json::from_value(json!({"guid": "G", "marca": 12})).unwrap();
        assert_eq!(record.marca.as_deref(), Some("12"));
    }

    #[test]
    fn asset_modification_on_tracked_fields_only() {
        let state = AssetState {
            guid: "G1".into(),
            tipus: Some("IFCDOOR".into()),
            subtipus: Some("Porta".into()),
            ubicacio: Some("CQA-P00-001".into()),
        };
        let mut record = AssetRecord {
            guid: Some("G1".into()),
            tipus: Some("IFCDOOR".into()),
            subtipus: Some("Porta".into()),
            ubicacio: Some("CQA-P00-001".into()),
            from_room: Some("R1".into()),
            ..Default::default()
        };
        assert!(!record.differs_from(&state));
        record.subtipus = Some("PortaTallafoc".into());
        assert!(record.differs_from(&state));
    }

    #[test]
    fn area_within_rounding_is_not_a_modification() {
        let state = space_state("S1", Some(12.345));
        assert!(!space_record("S1", json!(12.3451)).differs_from(&state));
        assert!(!space_record("S1", json!("12,345")).differs_from(&state));
        assert!(space_record("S1", json!(12.40)).differs_from(&state));
        assert!(space_record("S1", json!(null)).differs_from(&state));
    }

    #[test]
    fn space_numeric_fields_compare_as_text() {
        let mut state = space_state("S1", None);
        state.planta = Some("1".to_string());
        let record: SpaceRecord = serde_json::from_value(json!({
            "guid": "S1", "codi": "A-01", "edifici": "CQA", "planta": 1
        }))
        .unwrap();
        assert!(!record.differs_from(&state));
    }

    #[test]
    fn defaults_fill_only_absent_fields() {
        let defaults = AssetRecord {
            guid: Some("ignored".into()),
            tipus: Some("IFCDOOR".into()),
            ubicacio: Some("CQA-P00-000".into()),
            ..Default::default()
        };
        let record = AssetRecord {
            guid: Some("G1".into()),
            ubicacio: Some("CQB-P01-002".into()),
            ..Default::default()
        }
        .with_defaults(&defaults);
        assert_eq!(record.guid.as_deref(), Some("G1"));
        assert_eq!(record.tipus.as_deref(), Some("IFCDOOR"));
        assert_eq!(record.ubicacio.as_deref(), Some("CQB-P01-002"));

        let keyless = AssetRecord::default().with_defaults(&defaults);
        assert_eq!(keyless.key(), None);
    }

    #[test]
    fn space_defaults_include_building() {
        let defaults = SpaceRecord {
            edifici: Some("CQA".into()),
            ..Default::default()
        };
        let record = SpaceRecord {
            guid: Some("S1".into()),
            ..Default::default()
        }
        .with_defaults(&defaults);
        assert_eq!(record.partition(), Some("CQA".to_string()));
    }
}
