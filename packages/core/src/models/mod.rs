//! Data Models
//!
//! This module contains the data structures the migration engine works on:
//!
//! - `FieldDefinition` - One user-defined custom field of a tool instance
//! - `FieldChange` / `MigrationStrategy` - Detected schema differences and
//!   their remediation
//! - `DataEntry` / `EntryPatch` - Persisted rows and merge-semantics write
//!   payloads
//!
//! Field values are stored per entry as a flat JSON object keyed by field
//! name, so the field name is the only link between schema and data.

pub mod change;
pub mod entry;
pub mod field;
pub mod field_validation;

pub use change::{ChangeKind, FieldChange, MigrationStrategy, ScaleBound, StrategyMap};
pub use entry::{parse_custom_fields, CustomFieldsError, DataEntry, EntryPatch, FieldPatch};
pub use field::{FieldDefinition, FieldType};
pub use field_validation::{FieldValidationError, FieldValidator};
