//! Field Migration Helper
//!
//! Facade used by a field-configuration editor when the user saves a new
//! field list:
//!
//! ```text
//! check_migration_needed(old, new)
//!   ├─ NoMigration            → save
//!   ├─ Error { message }      → show message, do not save
//!   └─ NeedsMigration { .. }  → confirm → execute_migration → save on success
//! ```

use crate::db::EntryStore;
use crate::models::{FieldChange, FieldDefinition, FieldValidator, StrategyMap};
use crate::services::error::MigrationError;
use crate::services::migration::comparator::FieldConfigComparator;
use crate::services::migration::migrator::{FieldDataMigrator, MigrationOutcome};
use crate::services::migration::policy::MigrationPolicy;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Result of checking a field list change
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationCheck {
    /// Stored data is unaffected
    NoMigration,

    /// Stored data must be rewritten; requires user confirmation first
    NeedsMigration {
        changes: Vec<FieldChange>,
        strategies: StrategyMap,
    },

    /// The change must be rejected
    Error { message: String },
}

impl MigrationCheck {
    pub fn is_blocking(&self) -> bool {
        matches!(self, MigrationCheck::Error { .. })
    }
}

pub struct FieldMigrationHelper {
    migrator: FieldDataMigrator,
}

impl FieldMigrationHelper {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self::with_migrator(FieldDataMigrator::new(store))
    }

    pub fn with_migrator(migrator: FieldDataMigrator) -> Self {
        Self { migrator }
    }

    pub fn migrator(&self) -> &FieldDataMigrator {
        &self.migrator
    }

    /// Decide whether replacing `old_fields` with `new_fields` is allowed and
    /// whether stored data has to be migrated
    ///
    /// Pure: never touches the entry store.
    pub fn check_migration_needed(
        &self,
        old_fields: &[FieldDefinition],
        new_fields: &[FieldDefinition],
    ) -> MigrationCheck {
        if let Err(e) = FieldValidator::validate_definitions(new_fields) {
            return MigrationCheck::Error {
                message: format!("Invalid field configuration: {}", e),
            };
        }

        let changes = FieldConfigComparator::compare(old_fields, new_fields);
        if changes.is_empty() {
            return MigrationCheck::NoMigration;
        }

        let strategies = MigrationPolicy::get_strategies(&changes);

        if MigrationPolicy::has_error_strategy(&strategies) {
            return MigrationCheck::Error {
                message: MigrationPolicy::get_description(&changes, &strategies),
            };
        }

        if !MigrationPolicy::requires_migration(&strategies) {
            return MigrationCheck::NoMigration;
        }

        MigrationCheck::NeedsMigration {
            changes,
            strategies,
        }
    }

    /// Run the data migration for a confirmed [`MigrationCheck::NeedsMigration`]
    pub async fn execute_migration(
        &self,
        tool_instance_id: &str,
        changes: &[FieldChange],
        strategies: &StrategyMap,
        cancel: &CancellationToken,
    ) -> Result<MigrationOutcome, MigrationError> {
        self.migrator
            .migrate_custom_fields(tool_instance_id, changes, strategies, cancel)
            .await
    }

    /// Confirmation or rejection text for `changes`
    pub fn get_description(&self, changes: &[FieldChange], strategies: &StrategyMap) -> String {
        MigrationPolicy::get_description(changes, strategies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryEntryStore, StoreStats};
    use crate::models::{DataEntry, FieldType, MigrationStrategy};
    use serde_json::json;

    fn helper_with(entries: Vec<DataEntry>) -> (FieldMigrationHelper, Arc<InMemoryEntryStore>) {
        let store = Arc::new(InMemoryEntryStore::with_entries(entries));
        (FieldMigrationHelper::new(store.clone()), store)
    }

    fn numeric(name: &str) -> FieldDefinition {
        FieldDefinition::new(name, "Number", FieldType::Numeric)
    }

    #[test]
    fn test_identical_lists_need_nothing() {
        let (helper, _) = helper_with(vec![]);
        let fields = vec![numeric("age")];
        assert_eq!(
            helper.check_migration_needed(&fields, &fields),
            MigrationCheck::NoMigration
        );
    }

    #[test]
    fn test_added_field_needs_nothing() {
        let (helper, _) = helper_with(vec![]);
        let check = helper.check_migration_needed(&[], &[numeric("age")]);
        assert_eq!(check, MigrationCheck::NoMigration);
    }

    #[test]
    fn test_removed_field_needs_migration() {
        let (helper, _) = helper_with(vec![]);
        let check = helper.check_migration_needed(&[numeric("age")], &[]);

        let MigrationCheck::NeedsMigration {
            changes,
            strategies,
        } = check
        else {
            panic!("expected NeedsMigration");
        };
        assert_eq!(changes.len(), 1);
        assert_eq!(strategies[&changes[0]], MigrationStrategy::StripField);
    }

    #[test]
    fn test_type_change_is_blocking() {
        let (helper, _) = helper_with(vec![]);
        let check = helper.check_migration_needed(
            &[numeric("x")],
            &[FieldDefinition::new("x", "Number", FieldType::TextShort)],
        );

        assert!(check.is_blocking());
        let MigrationCheck::Error { message } = check else {
            unreachable!()
        };
        assert!(message.contains("cannot change type from NUMERIC to TEXT_SHORT"));
    }

    #[test]
    fn test_invalid_new_fields_are_blocking() {
        let (helper, _) = helper_with(vec![]);
        let scale = FieldDefinition::new("mood", "Mood", FieldType::Scale)
            .with_config(json!({"min": 5, "max": 1}));

        let check = helper.check_migration_needed(&[], &[scale]);
        let MigrationCheck::Error { message } = check else {
            panic!("expected Error");
        };
        assert!(message.starts_with("Invalid field configuration"));
    }

    #[test]
    fn test_unchanged_list_with_nan_bound_never_migrates() {
        let (helper, store) = helper_with(vec![DataEntry::new("e1", "tool-1", json!({"mood": 3}))]);
        let fields = vec![FieldDefinition::new("mood", "Mood", FieldType::Scale)
            .with_config(json!({"min": "NaN", "max": 5}))];

        let check = helper.check_migration_needed(&fields, &fields.clone());

        assert!(check.is_blocking());
        assert!(!matches!(check, MigrationCheck::NeedsMigration { .. }));
        assert_eq!(store.stats(), StoreStats::default());
    }

    #[tokio::test]
    async fn test_execute_delegates_to_migrator() {
        let (helper, store) = helper_with(vec![DataEntry::new(
            "e1",
            "tool-1",
            json!({"age": 30, "name": "x"}),
        )]);

        let MigrationCheck::NeedsMigration {
            changes,
            strategies,
        } = helper.check_migration_needed(&[numeric("age")], &[])
        else {
            panic!("expected NeedsMigration");
        };

        let outcome = helper
            .execute_migration("tool-1", &changes, &strategies, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.modified_count, 1);
        assert_eq!(store.stats(), StoreStats { reads: 1, writes: 1 });
        assert_eq!(
            store.entry("e1").await.unwrap().custom_fields,
            Some(json!({"name": "x"}))
        );
        assert!(helper
            .get_description(&changes, &strategies)
            .starts_with("1 field(s) removed"));
    }
}
