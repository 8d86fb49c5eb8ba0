//! Field Configuration Comparator
//!
//! Diffs two versions of a tool instance's field list. Fields are joined by
//! `name`; identity is never re-derived from content, so a renamed field shows
//! up as a removal plus an addition.
//!
//! Output order: all removals (old list order), all additions (new list
//! order), then per-field changes for names present in both (new list order).
//! Nothing downstream depends on this order for correctness.

use crate::models::{FieldChange, FieldDefinition, FieldType, ScaleBound};
use std::collections::{HashMap, HashSet};

/// Pure comparison of field lists
pub struct FieldConfigComparator;

impl FieldConfigComparator {
    /// Detect every change between `old_fields` and `new_fields`
    ///
    /// At most one change is emitted per common field. A type change
    /// dominates all other checks for that field.
    pub fn compare(
        old_fields: &[FieldDefinition],
        new_fields: &[FieldDefinition],
    ) -> Vec<FieldChange> {
        let mut old_by_name: HashMap<&str, &FieldDefinition> = HashMap::new();
        for field in old_fields {
            old_by_name.entry(field.name.as_str()).or_insert(field);
        }
        let new_names: HashSet<&str> = new_fields.iter().map(|f| f.name.as_str()).collect();

        let mut changes = Vec::new();

        let mut seen_removed = HashSet::new();
        for field in old_fields {
            let name = field.name.as_str();
            if !new_names.contains(name) && seen_removed.insert(name) {
                changes.push(FieldChange::Removed {
                    name: field.name.clone(),
                });
            }
        }

        let mut seen_added = HashSet::new();
        for field in new_fields {
            let name = field.name.as_str();
            if !old_by_name.contains_key(name) && seen_added.insert(name) {
                changes.push(FieldChange::Added {
                    field: field.clone(),
                });
            }
        }

        let mut seen_common = HashSet::new();
        for new_field in new_fields {
            let Some(old_field) = old_by_name.get(new_field.name.as_str()) else {
                continue;
            };
            if !seen_common.insert(new_field.name.as_str()) {
                continue;
            }
            if let Some(change) = Self::compare_field(old_field, new_field) {
                changes.push(change);
            }
        }

        changes
    }

    /// Compare two versions of the same field
    ///
    /// Returns the single most significant change, if any.
    pub fn compare_field(old: &FieldDefinition, new: &FieldDefinition) -> Option<FieldChange> {
        if old.field_type != new.field_type {
            return Some(FieldChange::TypeChanged {
                name: new.name.clone(),
                old_type: old.field_type,
                new_type: new.field_type,
            });
        }

        let structural = match new.field_type {
            FieldType::Scale => Self::compare_scale(old, new),
            FieldType::Choice => Self::compare_choice(old, new),
            _ => None,
        };
        if structural.is_some() {
            return structural;
        }

        if old.differs_cosmetically(new) {
            return Some(FieldChange::CosmeticChange {
                name: new.name.clone(),
            });
        }

        None
    }

    fn compare_scale(old: &FieldDefinition, new: &FieldDefinition) -> Option<FieldChange> {
        let (old_min, old_max) = old.scale_range();
        let (new_min, new_max) = new.scale_range();
        let (old_min, old_max) = (old_min.map(ScaleBound), old_max.map(ScaleBound));
        let (new_min, new_max) = (new_min.map(ScaleBound), new_max.map(ScaleBound));

        // Numeric comparison: 5 and 5.0 are the same bound
        if old_min == new_min && old_max == new_max {
            return None;
        }

        Some(FieldChange::ScaleRangeChanged {
            name: new.name.clone(),
            old_min,
            old_max,
            new_min,
            new_max,
        })
    }

    fn compare_choice(old: &FieldDefinition, new: &FieldDefinition) -> Option<FieldChange> {
        let old_multiple = old.is_multiple();
        let new_multiple = new.is_multiple();
        if old_multiple != new_multiple {
            return Some(FieldChange::ChoiceMultipleChanged {
                name: new.name.clone(),
                old_multiple,
                new_multiple,
            });
        }

        let new_options: HashSet<String> = new.choice_options().into_iter().collect();
        let removed_options: Vec<String> = old
            .choice_options()
            .into_iter()
            .filter(|option| !new_options.contains(option))
            .collect();

        if removed_options.is_empty() {
            return None;
        }

        Some(FieldChange::ChoiceOptionsRemoved {
            name: new.name.clone(),
            removed_options,
        })
    }
}
