//! Data Entries and Write Payloads
//!
//! A data entry is one persisted row owned by a tool instance. Its custom
//! field values live in a flat JSON object keyed by field name. Depending on
//! how the row was written, that payload arrives as a JSON object, a JSON
//! encoded string, or not at all.
//!
//! Writes go through a merge: keys absent from a patch are left untouched in
//! storage. Deleting a key therefore has to be spelled out explicitly, which
//! is what [`FieldPatch::Delete`] is for.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a stored custom-fields payload could not be read as a field map
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CustomFieldsError {
    #[error("custom fields string is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("custom fields string decodes to {0} instead of an object")]
    EncodedNotAnObject(&'static str),

    #[error("custom fields payload is {0} instead of an object")]
    NotAnObject(&'static str),
}

/// One persisted row of a tool instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataEntry {
    pub id: String,

    pub tool_instance_id: String,

    /// Raw custom-fields payload (object, JSON string, or absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Value>,

    /// Remaining columns of the row, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataEntry {
    pub fn new(
        id: impl Into<String>,
        tool_instance_id: impl Into<String>,
        custom_fields: Value,
    ) -> Self {
        Self {
            id: id.into(),
            tool_instance_id: tool_instance_id.into(),
            custom_fields: Some(custom_fields),
            extra: Map::new(),
        }
    }

    /// Parsed custom fields of this entry
    pub fn parsed_custom_fields(&self) -> Result<Map<String, Value>, CustomFieldsError> {
        parse_custom_fields(self.custom_fields.as_ref())
    }
}

/// Parse a custom-fields payload into a field map
///
/// Absent payloads, `null`, and blank strings parse to an empty map. A string
/// payload is decoded as JSON.
///
/// # Errors
///
/// - `InvalidJson`: a string payload is not valid JSON
/// - `EncodedNotAnObject`: a string payload decodes to a non-object
/// - `NotAnObject`: the payload itself is a non-object
pub fn parse_custom_fields(
    payload: Option<&Value>,
) -> Result<Map<String, Value>, CustomFieldsError> {
    match payload {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(Value::String(raw)) => {
            if raw.trim().is_empty() {
                return Ok(Map::new());
            }
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(Value::Null) => Ok(Map::new()),
                Ok(other) => Err(CustomFieldsError::EncodedNotAnObject(json_kind(&other))),
                Err(e) => Err(CustomFieldsError::InvalidJson(e.to_string())),
            }
        }
        Some(other) => Err(CustomFieldsError::NotAnObject(json_kind(other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Write instruction for one custom-field key
///
/// Keeps "leave this key alone", "store this value" and "remove this key"
/// apart at the type level instead of overloading `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldPatch {
    /// Leave the stored value as it is
    #[default]
    Unchanged,
    /// Store this value
    Set(Value),
    /// Remove the key from storage
    Delete,
}

impl FieldPatch {
    /// Wire representation for merge-semantics writes
    ///
    /// `Delete` becomes the explicit `null` sentinel; `Unchanged` is omitted.
    pub fn to_wire(&self) -> Option<Value> {
        match self {
            FieldPatch::Unchanged => None,
            FieldPatch::Set(value) => Some(value.clone()),
            FieldPatch::Delete => Some(Value::Null),
        }
    }

    /// Apply this patch to `key` in a stored field map
    pub fn apply_to(&self, key: &str, fields: &mut Map<String, Value>) {
        match self {
            FieldPatch::Unchanged => {}
            FieldPatch::Set(value) => {
                fields.insert(key.to_string(), value.clone());
            }
            FieldPatch::Delete => {
                fields.remove(key);
            }
        }
    }
}

/// Custom-field write payload for a single entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub id: String,
    pub custom_fields: BTreeMap<String, FieldPatch>,
}

impl EntryPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            custom_fields: BTreeMap::new(),
        }
    }

    /// Build the patch that turns `before` into `after` under merge semantics
    ///
    /// Every key of `after` is written with its value, and every key of
    /// `before` missing from `after` is written as `Delete`. Without the
    /// deletions a merge would leave the stale keys in place.
    pub fn from_diff(
        id: impl Into<String>,
        before: &Map<String, Value>,
        after: &Map<String, Value>,
    ) -> Self {
        let mut patch = Self::new(id);
        for (key, value) in after {
            patch
                .custom_fields
                .insert(key.clone(), FieldPatch::Set(value.clone()));
        }
        for key in before.keys() {
            if !after.contains_key(key) {
                patch.custom_fields.insert(key.clone(), FieldPatch::Delete);
            }
        }
        patch
    }

    /// Keys this patch removes from storage
    pub fn deleted_keys(&self) -> Vec<&str> {
        self.custom_fields
            .iter()
            .filter(|(_, patch)| matches!(patch, FieldPatch::Delete))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Custom-fields object as sent to a merge-semantics write command
    pub fn wire_custom_fields(&self) -> Value {
        let wire: Map<String, Value> = self
            .custom_fields
            .iter()
            .filter_map(|(key, patch)| patch.to_wire().map(|value| (key.clone(), value)))
            .collect();
        Value::Object(wire)
    }

    /// Full wire entry: `{ "id": ..., "customFields": {...} }`
    pub fn to_wire(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("id".to_string(), Value::String(self.id.clone()));
        entry.insert("customFields".to_string(), self.wire_custom_fields());
        Value::Object(entry)
    }

    /// Merge this patch into a stored field map
    pub fn apply_to(&self, fields: &mut Map<String, Value>) {
        for (key, patch) in &self.custom_fields {
            patch.apply_to(key, fields);
        }
    }
}
