//! Custom-Field Migration Engine
//!
//! Keeps stored entries consistent with a tool instance's field list when
//! that list is edited.
//!
//! - [`FieldConfigComparator`] diffs old and new field lists
//! - [`MigrationPolicy`] assigns a [`MigrationStrategy`](crate::models::MigrationStrategy)
//!   to every change
//! - [`FieldDataMigrator`] rewrites stored entries
//! - [`FieldMigrationHelper`] ties the above together for editors
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use toolfields_core::db::InMemoryEntryStore;
//! use toolfields_core::models::{FieldDefinition, FieldType};
//! use toolfields_core::services::migration::{
//!     CancellationToken, FieldMigrationHelper, MigrationCheck,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let helper = FieldMigrationHelper::new(Arc::new(InMemoryEntryStore::new()));
//!     let old = vec![FieldDefinition::new("age", "Age", FieldType::Numeric)];
//!
//!     if let MigrationCheck::NeedsMigration { changes, strategies } =
//!         helper.check_migration_needed(&old, &[])
//!     {
//!         println!("{}", helper.get_description(&changes, &strategies));
//!         helper
//!             .execute_migration("tool-1", &changes, &strategies, &CancellationToken::new())
//!             .await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod comparator;
pub mod events;
pub mod helper;
pub mod migrator;
pub mod policy;

pub use comparator::FieldConfigComparator;
pub use events::{CancelStage, MigrationEvent, MigrationObserver, NoopObserver, TracingObserver};
pub use helper::{FieldMigrationHelper, MigrationCheck};
pub use migrator::{FieldDataMigrator, MigrationOutcome};
pub use policy::{MigrationPolicy, NO_CHANGES_MESSAGE};
pub use tokio_util::sync::CancellationToken;
