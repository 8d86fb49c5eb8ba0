//! Migration Policy
//!
//! Classifies each detected change by its impact on stored data:
//!
//! | Change                  | Strategy               |
//! |-------------------------|------------------------|
//! | `Added`                 | `None`                 |
//! | `Removed`               | `StripField`           |
//! | `NameChanged`           | `Error`                |
//! | `TypeChanged`           | `Error`                |
//! | `ChoiceOptionsRemoved`  | `StripFieldIfValue`    |
//! | `ScaleRangeChanged`     | `StripField`           |
//! | `ChoiceMultipleChanged` | `StripField`           |
//! | `CosmeticChange`        | `None`                 |
//!
//! Scale values are stripped unconditionally: a value inside the new range
//! may still have been recorded against a different scale.

use crate::models::{ChangeKind, FieldChange, MigrationStrategy, StrategyMap};

/// Message used when there is nothing to describe
pub const NO_CHANGES_MESSAGE: &str = "No field changes detected.";

/// Pure mapping from changes to strategies
pub struct MigrationPolicy;

impl MigrationPolicy {
    /// Strategy for a single change
    pub fn strategy_for(change: &FieldChange) -> MigrationStrategy {
        match change {
            FieldChange::Added { .. } => MigrationStrategy::None,
            FieldChange::Removed { .. } => MigrationStrategy::StripField,
            FieldChange::NameChanged { .. } => MigrationStrategy::Error,
            FieldChange::TypeChanged { .. } => MigrationStrategy::Error,
            FieldChange::ChoiceOptionsRemoved { .. } => MigrationStrategy::StripFieldIfValue,
            FieldChange::ScaleRangeChanged { .. } => MigrationStrategy::StripField,
            FieldChange::ChoiceMultipleChanged { .. } => MigrationStrategy::StripField,
            FieldChange::CosmeticChange { .. } => MigrationStrategy::None,
        }
    }

    /// Strategy for every change, keyed by the change
    pub fn get_strategies(changes: &[FieldChange]) -> StrategyMap {
        changes
            .iter()
            .map(|change| (change.clone(), Self::strategy_for(change)))
            .collect()
    }

    /// Whether any change must be rejected
    pub fn has_error_strategy(strategies: &StrategyMap) -> bool {
        strategies
            .values()
            .any(|strategy| *strategy == MigrationStrategy::Error)
    }

    /// Whether any change rewrites stored entries
    pub fn requires_migration(strategies: &StrategyMap) -> bool {
        strategies.values().any(MigrationStrategy::touches_data)
    }

    /// Human-readable summary of `changes` and their consequences
    ///
    /// Lists counts per change kind, then one line per rejected change. Used
    /// both as confirmation text and as the blocking error message.
    pub fn get_description(changes: &[FieldChange], strategies: &StrategyMap) -> String {
        if changes.is_empty() {
            return NO_CHANGES_MESSAGE.to_string();
        }

        let mut lines = Vec::new();

        for kind in [
            ChangeKind::Added,
            ChangeKind::Removed,
            ChangeKind::NameChanged,
            ChangeKind::TypeChanged,
            ChangeKind::ChoiceOptionsRemoved,
            ChangeKind::ScaleRangeChanged,
            ChangeKind::ChoiceMultipleChanged,
            ChangeKind::CosmeticChange,
        ] {
            let count = changes.iter().filter(|c| c.kind() == kind).count();
            if count > 0 {
                lines.push(Self::count_line(kind, count));
            }
        }

        let blocked: Vec<String> = changes
            .iter()
            .filter(|change| strategies.get(*change) == Some(&MigrationStrategy::Error))
            .map(Self::error_line)
            .collect();

        if blocked.is_empty() {
            if Self::requires_migration(strategies) {
                lines.push(
                    "Affected values will be removed from existing entries. This cannot be undone."
                        .to_string(),
                );
            }
        } else {
            lines.push("The following changes are not allowed:".to_string());
            lines.extend(blocked);
        }

        lines.join("\n")
    }

    fn count_line(kind: ChangeKind, count: usize) -> String {
        let what = match kind {
            ChangeKind::Added => "field(s) added",
            ChangeKind::Removed => "field(s) removed",
            ChangeKind::NameChanged => "field(s) renamed",
            ChangeKind::TypeChanged => "field type(s) changed",
            ChangeKind::ChoiceOptionsRemoved => "choice field(s) with removed options",
            ChangeKind::ScaleRangeChanged => "scale range(s) changed",
            ChangeKind::ChoiceMultipleChanged => {
                "choice field(s) switched between single and multiple selection"
            }
            ChangeKind::CosmeticChange => "field(s) with display changes only",
        };
        format!("{} {}", count, what)
    }

    fn error_line(change: &FieldChange) -> String {
        match change {
            FieldChange::NameChanged { old_name, new_name } => format!(
                "- Field '{}' cannot be renamed to '{}': field names are permanent identifiers",
                old_name, new_name
            ),
            FieldChange::TypeChanged {
                name,
                old_type,
                new_type,
            } => format!(
                "- Field '{}' cannot change type from {} to {}",
                name, old_type, new_type
            ),
            other => format!(
                "- Change to field '{}' is not allowed ({})",
                other.field_name(),
                other
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldDefinition, FieldType};

    fn removed(name: &str) -> FieldChange {
        FieldChange::Removed {
            name: name.to_string(),
        }
    }

    fn all_variants() -> Vec<FieldChange> {
        vec![
            FieldChange::Added {
                field: FieldDefinition::new("notes", "Notes", FieldType::TextShort),
            },
            removed("age"),
            FieldChange::NameChanged {
                old_name: "mood".to_string(),
                new_name: "feeling".to_string(),
            },
            FieldChange::TypeChanged {
                name: "x".to_string(),
                old_type: FieldType::Numeric,
                new_type: FieldType::TextShort,
            },
            FieldChange::ChoiceOptionsRemoved {
                name: "color".to_string(),
                removed_options: vec!["green".to_string()],
            },
            FieldChange::scale_range_changed("mood", 1.0, 5.0, 1.0, 10.0),
            FieldChange::ChoiceMultipleChanged {
                name: "tags".to_string(),
                old_multiple: false,
                new_multiple: true,
            },
            FieldChange::CosmeticChange {
                name: "weight".to_string(),
            },
        ]
    }

    #[test]
    fn test_strategy_table() {
        let expected = [
            MigrationStrategy::None,
            MigrationStrategy::StripField,
            MigrationStrategy::Error,
            MigrationStrategy::Error,
            MigrationStrategy::StripFieldIfValue,
            MigrationStrategy::StripField,
            MigrationStrategy::StripField,
            MigrationStrategy::None,
        ];
        for (change, strategy) in all_variants().iter().zip(expected) {
            assert_eq!(MigrationPolicy::strategy_for(change), strategy, "{}", change);
        }
    }

    #[test]
    fn test_get_strategies_covers_every_change() {
        let changes = all_variants();
        let strategies = MigrationPolicy::get_strategies(&changes);
        assert_eq!(strategies.len(), changes.len());
        for change in &changes {
            assert!(strategies.contains_key(change));
        }
    }

    #[test]
    fn test_removed_requires_migration_without_error() {
        let strategies = MigrationPolicy::get_strategies(&[removed("age")]);
        assert!(MigrationPolicy::requires_migration(&strategies));
        assert!(!MigrationPolicy::has_error_strategy(&strategies));
    }

    #[test]
    fn test_cosmetic_and_added_need_nothing() {
        let changes = vec![
            FieldChange::CosmeticChange {
                name: "x".to_string(),
            },
            FieldChange::Added {
                field: FieldDefinition::new("y", "Y", FieldType::Boolean),
            },
        ];
        let strategies = MigrationPolicy::get_strategies(&changes);
        assert!(!MigrationPolicy::requires_migration(&strategies));
        assert!(!MigrationPolicy::has_error_strategy(&strategies));
    }

    #[test]
    fn test_empty_description() {
        let description = MigrationPolicy::get_description(&[], &StrategyMap::new());
        assert_eq!(description, NO_CHANGES_MESSAGE);
    }

    #[test]
    fn test_description_counts_and_consequence() {
        let changes = vec![
            removed("age"),
            removed("height"),
            FieldChange::scale_range_changed("mood", 1.0, 5.0, 1.0, 10.0),
        ];
        let strategies = MigrationPolicy::get_strategies(&changes);

        let description = MigrationPolicy::get_description(&changes, &strategies);
        assert_eq!(
            description,
            "2 field(s) removed\n\
             1 scale range(s) changed\n\
             Affected values will be removed from existing entries. This cannot be undone."
        );
    }

    #[test]
    fn test_description_names_each_blocked_change() {
        let changes = all_variants();
        let strategies = MigrationPolicy::get_strategies(&changes);

        let description = MigrationPolicy::get_description(&changes, &strategies);
        assert!(description.contains("The following changes are not allowed:"));
        assert!(description.contains(
            "- Field 'mood' cannot be renamed to 'feeling': field names are permanent identifiers"
        ));
        assert!(description.contains("- Field 'x' cannot change type from NUMERIC to TEXT_SHORT"));
        assert!(!description.contains("This cannot be undone"));
    }

    #[test]
    fn test_description_generic_blocked_line() {
        let change = removed("age");
        let mut strategies = StrategyMap::new();
        strategies.insert(change.clone(), MigrationStrategy::Error);

        let description = MigrationPolicy::get_description(&[change], &strategies);
        assert!(description.contains("- Change to field 'age' is not allowed (removed 'age')"));
    }
}
