//! Asset classification driving the upsert cascade.
//!
//! Computed once per record; every cascade tier dispatches on the result
//! instead of re-matching type and subtype strings.

use serde::{Deserialize, Serialize};

/// IFC type marking an asset as a door.
pub const DOOR_TYPE: &str = "IFCDOOR";

/// Subtypes that mean "fire door" when matched exactly (case-insensitive).
const FIRE_DOOR_TERMS: &[&str] = &[
    "fire door",
    "firedoor",
    "fire-door",
    "puerta cortafuegos",
    "porta rf",
];

/// Any subtype containing this (case-insensitive) is a fire door.
const FIRE_DOOR_STEM: &str = "tallafoc";

/// Which rows an asset owns besides its `actius` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Only the `actius` row.
    Plain,
    /// `actius` + `ifcdoor`.
    Door,
    /// `actius` + `ifcdoor` + `ifcdoor_fire`.
    FireDoor,
}

impl AssetKind {
    pub fn classify(tipus: Option<&str>, subtipus: Option<&str>) -> Self {
        let is_door = tipus.is_some_and(|t| t.trim().eq_ignore_ascii_case(DOOR_TYPE));
        if !is_door {
            return Self::Plain;
        }
        if subtipus.is_some_and(is_fire_door_subtype) {
            Self::FireDoor
        } else {
            Self::Door
        }
    }

    /// Whether the cascade writes an `ifcdoor` row.
    pub fn has_door(self) -> bool {
        matches!(self, Self::Door | Self::FireDoor)
    }

    /// Whether the cascade writes an `ifcdoor_fire` row.
    pub fn has_fire_door(self) -> bool {
        matches!(self, Self::FireDoor)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Door => "door",
            Self::FireDoor => "fire_door",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_fire_door_subtype(subtipus: &str) -> bool {
    let lowered = subtipus.trim().to_lowercase();
    FIRE_DOOR_TERMS.contains(&lowered.as_str()) || lowered.contains(FIRE_DOOR_STEM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_doors_are_plain() {
        assert_eq!(AssetKind::classify(Some("IFCFURNISHINGELEMENT"), Some("Dutxa")), AssetKind::Plain);
        assert_eq!(AssetKind::classify(None, Some("PortaTallafoc")), AssetKind::Plain);
    }

    #[test]
    fn doors_without_fire_subtype() {
        assert_eq!(AssetKind::classify(Some("IFCDOOR"), None), AssetKind::Door);
        assert_eq!(AssetKind::classify(Some("ifcdoor"), Some("Porta batent")), AssetKind::Door);
    }

    #[test]
    fn fire_doors_by_stem_and_terms() {
        assert_eq!(AssetKind::classify(Some("IFCDOOR"), Some("PortaTallafoc")), AssetKind::FireDoor);
        assert_eq!(AssetKind::classify(Some("IFCDOOR"), Some("porta TALLAFOCS EI2-60")), AssetKind::FireDoor);
        assert_eq!(AssetKind::classify(Some("IFCDOOR"), Some("Fire Door")), AssetKind::FireDoor);
        assert_eq!(AssetKind::classify(Some("IFCDOOR"), Some("puerta cortafuegos")), AssetKind::FireDoor);
    }

    #[test]
    fn exact_terms_do_not_match_as_substrings() {
        assert!(!is_fire_door_subtype("fire door frame"));
        assert!(!is_fire_door_subtype("porta rfx"));
    }

    #[test]
    fn tiers() {
        assert!(!AssetKind::Plain.has_door());
        assert!(AssetKind::Door.has_door());
        assert!(!AssetKind::Door.has_fire_door());
        assert!(AssetKind::FireDoor.has_door());
        assert!(AssetKind::FireDoor.has_fire_door());
    }
}
