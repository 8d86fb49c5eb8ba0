//! In-memory EntryStore
//!
//! Reference implementation of the entry read/write commands with the same
//! merge semantics as the host application's write path. Used by tests,
//! benches and tooling that needs a store without a database.

use crate::db::entry_store::{BatchUpdateRequest, BatchUpdateResponse, EntryStore};
use crate::models::{parse_custom_fields, DataEntry};
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Column stamped on every entry touched by a batch update
pub const UPDATED_AT_COLUMN: &str = "updatedAt";

/// Number of commands a store has served
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub reads: usize,
    pub writes: usize,
}

/// Entry store holding every row in memory
#[derive(Debug, Default)]
pub struct InMemoryEntryStore {
    entries: RwLock<Vec<DataEntry>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries
    pub fn with_entries(entries: Vec<DataEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
            ..Self::default()
        }
    }

    /// Insert an entry, generating an id when it has none
    ///
    /// Returns the id of the inserted entry.
    pub async fn insert_entry(&self, mut entry: DataEntry) -> String {
        if entry.id.is_empty() {
            entry.id = uuid::Uuid::new_v4().to_string();
        }
        let id = entry.id.clone();
        self.entries.write().await.push(entry);
        id
    }

    /// Snapshot of one entry, without counting as a read command
    pub async fn entry(&self, id: &str) -> Option<DataEntry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            reads: self.reads.load(Ordering::SeqCst),
            writes: self.writes.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl EntryStore for InMemoryEntryStore {
    async fn get_entries(&self, tool_instance_id: &str) -> Result<Vec<DataEntry>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.tool_instance_id == tool_instance_id)
            .cloned()
            .collect())
    }

    async fn batch_update_entries(
        &self,
        request: BatchUpdateRequest,
    ) -> Result<BatchUpdateResponse> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.write().await;
        apply_batch_update(&mut entries, &request)
    }
}

/// Merge a batch of patches into `entries`
///
/// The whole batch is validated before anything is modified: a patch for an
/// id unknown to the tool instance rejects the batch. Every patched entry is
/// stamped with [`UPDATED_AT_COLUMN`].
pub fn apply_batch_update(
    entries: &mut [DataEntry],
    request: &BatchUpdateRequest,
) -> Result<BatchUpdateResponse> {
    let known: HashSet<&str> = entries
        .iter()
        .filter(|entry| entry.tool_instance_id == request.tool_instance_id)
        .map(|entry| entry.id.as_str())
        .collect();
    for patch in &request.entries {
        if !known.contains(patch.id.as_str()) {
            bail!(
                "Entry not found: {} (tool instance {})",
                patch.id,
                request.tool_instance_id
            );
        }
    }

    let now = Utc::now().to_rfc3339();
    let mut updated_count = 0;
    for patch in &request.entries {
        let Some(entry) = entries.iter_mut().find(|entry| {
            entry.id == patch.id && entry.tool_instance_id == request.tool_instance_id
        }) else {
            continue;
        };

        // An unreadable payload is replaced rather than merged into
        let mut fields = parse_custom_fields(entry.custom_fields.as_ref()).unwrap_or_default();
        patch.apply_to(&mut fields);
        entry.custom_fields = Some(Value::Object(fields));
        entry
            .extra
            .insert(UPDATED_AT_COLUMN.to_string(), Value::String(now.clone()));
        updated_count += 1;
    }

    Ok(BatchUpdateResponse { updated_count })
}
