//! Data Entry Persistence
//!
//! The migration engine does not own storage. It consumes the host
//! application's generic bulk read and bulk write commands through the
//! [`EntryStore`] trait:
//!
//! - `get_entries` - every entry of one tool instance, unpaginated
//! - `batch_update_entries` - merge-semantics update of many entries at once
//!
//! [`InMemoryEntryStore`] implements the same merge semantics without a
//! database, for tests and tooling.

mod entry_store;
mod memory_store;

pub use entry_store::{BatchUpdateRequest, BatchUpdateResponse, EntryStore};
pub use memory_store::{apply_batch_update, InMemoryEntryStore, StoreStats, UPDATED_AT_COLUMN};
