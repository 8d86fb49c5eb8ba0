//! Dry-run reports for `field-migrate`

use serde::Serialize;
use serde_json::Value;
use toolfields_core::models::EntryPatch;

/// Write payload one entry would receive
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedEntry {
    pub id: String,
    pub removed_fields: Vec<String>,
    /// Exactly what the batch write command would be sent
    pub custom_fields: Value,
}

impl From<&EntryPatch> for PlannedEntry {
    fn from(patch: &EntryPatch) -> Self {
        Self {
            id: patch.id.clone(),
            removed_fields: patch.deleted_keys().into_iter().map(str::to_string).collect(),
            custom_fields: patch.wire_custom_fields(),
        }
    }
}

/// What a migration would do, without doing it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunReport {
    pub tool_instance_id: String,
    pub total_count: usize,
    pub modified_count: usize,
    pub entries: Vec<PlannedEntry>,
}

impl DryRunReport {
    pub fn new(
        tool_instance_id: impl Into<String>,
        total_count: usize,
        patches: &[EntryPatch],
    ) -> Self {
        Self {
            tool_instance_id: tool_instance_id.into(),
            total_count,
            modified_count: patches.len(),
            entries: patches.iter().map(PlannedEntry::from).collect(),
        }
    }
}
