//! EntryStore Trait - Data Entry Persistence Abstraction
//!
//! The migration engine never talks to a database directly. It consumes two
//! generic commands offered by the host application:
//!
//! - **bulk read**: every entry of a tool instance, unpaginated
//! - **bulk write**: merge-semantics update of many entries in one call
//!
//! # Design Decisions
//!
//! 1. **Async-First**: Both commands may wait on I/O, so both are async
//! 2. **Merge Writes**: Keys absent from a patch stay untouched in storage;
//!    deletions travel as explicit [`FieldPatch::Delete`](crate::models::FieldPatch)
//! 3. **Error Handling**: Uses `anyhow::Result`; callers only surface the
//!    collaborator's message
//! 4. **No Transactions**: The single batch write is the only atomic unit
//!
//! # Examples
//!
//! ```rust,no_run
//! use toolfields_core::db::{EntryStore, InMemoryEntryStore};
//! use toolfields_core::models::DataEntry;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = InMemoryEntryStore::new();
//!     store
//!         .insert_entry(DataEntry::new("e1", "tool-1", json!({"mood": 4})))
//!         .await;
//!
//!     let entries = store.get_entries("tool-1").await?;
//!     assert_eq!(entries.len(), 1);
//!     Ok(())
//! }
//! ```

use crate::models::{DataEntry, EntryPatch};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Request for a merge-semantics batch update
#[derive(Debug, Clone, PartialEq)]
pub struct BatchUpdateRequest {
    pub tool_instance_id: String,

    pub entries: Vec<EntryPatch>,

    /// Relaxed validation: entries are checked only for the keys they carry
    pub partial_validation: bool,
}

impl BatchUpdateRequest {
    /// Wire form of the request as sent to a generic command bus
    pub fn to_wire(&self) -> Value {
        serde_json::json!({
            "toolInstanceId": self.tool_instance_id,
            "entries": self.entries.iter().map(EntryPatch::to_wire).collect::<Vec<_>>(),
            "partialValidation": self.partial_validation,
        })
    }
}

/// Result of a successful batch update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchUpdateResponse {
    pub updated_count: usize,
}

/// Abstraction over the host's generic entry read/write commands
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a migration future can move
/// between runtime threads.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Load every entry of a tool instance
    ///
    /// No pagination parameter exists: implementations must return the
    /// complete set.
    async fn get_entries(&self, tool_instance_id: &str) -> Result<Vec<DataEntry>>;

    /// Merge the given patches into stored entries
    ///
    /// # Errors
    ///
    /// Returns error if the batch cannot be applied. Implementations must not
    /// apply part of a failed batch.
    async fn batch_update_entries(
        &self,
        request: BatchUpdateRequest,
    ) -> Result<BatchUpdateResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldPatch;
    use serde_json::json;

    #[test]
    fn test_request_wire_form_carries_null_sentinels() {
        let mut patch = EntryPatch::new("e1");
        patch
            .custom_fields
            .insert("mood".to_string(), FieldPatch::Set(json!(3)));
        patch
            .custom_fields
            .insert("color".to_string(), FieldPatch::Delete);

        let request = BatchUpdateRequest {
            tool_instance_id: "tool-1".to_string(),
            entries: vec![patch],
            partial_validation: true,
        };

        assert_eq!(
            request.to_wire(),
            json!({
                "toolInstanceId": "tool-1",
                "entries": [{"id": "e1", "customFields": {"color": null, "mood": 3}}],
                "partialValidation": true
            })
        );
    }
}
