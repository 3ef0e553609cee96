//! Parsing of bulk sync request bodies into typed snapshots.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::plan::SyncMode;
use super::records::SnapshotEntity;
use crate::error::CoreError;

/// Keys under which an object body may carry its record array, in lookup
/// order.
pub const RECORD_ARRAY_KEYS: &[&str] = &["records", "actius", "spaces", "items"];

/// A record left out of reconciliation, with its position in the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The element could not be read as a record.
    Malformed(String),
    /// Neither the identifier nor its fallback is present.
    MissingKey,
    /// The building code cannot be determined.
    MissingPartition,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(detail) => write!(f, "malformed record: {detail}"),
            Self::MissingKey => f.write_str("missing identifier"),
            Self::MissingPartition => f.write_str("missing building"),
        }
    }
}

/// One parsed record and its index in the request body.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry<T> {
    pub index: usize,
    pub record: T,
}

/// A parsed bulk sync request.
#[derive(Debug, Clone)]
pub struct SyncRequest<T> {
    /// Records in body order, defaults already applied.
    pub entries: Vec<SnapshotEntry<T>>,
    /// Elements that failed to parse.
    pub malformed: Vec<SkippedRecord>,
    pub confirm_delete: Option<bool>,
    pub mode: Option<SyncMode>,
}

impl<T: SnapshotEntity> SyncRequest<T> {
    /// Accepts a bare array of records, or an object carrying the array
    /// under one of [`RECORD_ARRAY_KEYS`] plus optional `defaults`,
    /// `confirmDelete` and `mode`.
    ///
    /// Structural problems with the body are errors. Problems with a single
    /// element only skip that element.
    pub fn from_json(body: Value) -> Result<Self, CoreError> {
        match body {
            Value::Array(items) => Ok(Self::from_items(items, None, None, None)),
            Value::Object(mut object) => {
                let items = take_record_array(&mut object)?;
                let defaults = take_defaults::<T>(&mut object)?;
                let confirm_delete = take_confirm_delete(&mut object)?;
                let mode = take_mode(&mut object)?;
                Ok(Self::from_items(items, defaults.as_ref(), confirm_delete, mode))
            }
            _ => Err(CoreError::Validation(
                "Body must be an array of records or an object with a 'records' array".into(),
            )),
        }
    }

    fn from_items(
        items: Vec<Value>,
        defaults: Option<&T>,
        confirm_delete: Option<bool>,
        mode: Option<SyncMode>,
    ) -> Self {
        let mut entries = Vec::with_capacity(items.len());
        let mut malformed = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            if !item.is_object() {
                malformed.push(SkippedRecord {
                    index,
                    reason: SkipReason::Malformed("expected an object".into()),
                });
                continue;
            }
            match serde_json::from_value::<T>(item) {
                Ok(record) => {
                    let record = match defaults {
                        Some(defaults) => record.with_defaults(defaults),
                        None => record,
                    };
                    entries.push(SnapshotEntry { index, record });
                }
                Err(e) => malformed.push(SkippedRecord {
                    index,
                    reason: SkipReason::Malformed(e.to_string()),
                }),
            }
        }

        Self {
            entries,
            malformed,
            confirm_delete,
            mode,
        }
    }

    /// Number of elements in the request body.
    pub fn total_records(&self) -> usize {
        self.entries.len() + self.malformed.len()
    }
}

fn take_record_array(object: &mut Map<String, Value>) -> Result<Vec<Value>, CoreError> {
    let Some(key) = RECORD_ARRAY_KEYS.iter().find(|k| object.contains_key(**k)) else {
        return Err(CoreError::Validation(format!(
            "Body object must carry the records under one of: {}",
            RECORD_ARRAY_KEYS.join(", ")
        )));
    };
    match object.remove(*key) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(CoreError::Validation(format!("'{key}' must be an array"))),
    }
}

fn take_defaults<T: SnapshotEntity>(
    object: &mut Map<String, Value>,
) -> Result<Option<T>, CoreError> {
    match object.remove("defaults") {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Object(_)) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| CoreError::Validation(format!("Invalid defaults: {e}"))),
        Some(_) => Err(CoreError::Validation("'defaults' must be an object".into())),
    }
}

fn take_confirm_delete(object: &mut Map<String, Value>) -> Result<Option<bool>, CoreError> {
    let value = object
        .remove("confirmDelete")
        .or_else(|| object.remove("confirm_delete"));
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(_) => Err(CoreError::Validation(
            "'confirmDelete' must be a boolean".into(),
        )),
    }
}

fn take_mode(object: &mut Map<String, Value>) -> Result<Option<SyncMode>, CoreError> {
    match object.remove("mode") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => SyncMode::deserialize(value).map(Some).map_err(|_| {
            CoreError::Validation(
                "'mode' must be one of: auto_commit, preview_then_commit".into(),
            )
        }),
    }
}
