//! Business Services
//!
//! - `migration` - Field list comparison, migration policy and the data
//!   migrator that keeps stored entries consistent with field edits
//!
//! Services sit between the entry store and editors, enforcing which field
//! changes are allowed and what they do to existing data.

pub mod error;
pub mod migration;

pub use error::MigrationError;
pub use migration::{
    CancellationToken, FieldConfigComparator, FieldDataMigrator, FieldMigrationHelper,
    MigrationCheck, MigrationOutcome, MigrationPolicy,
};
