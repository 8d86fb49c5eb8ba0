//! Field Changes and Migration Strategies
//!
//! A `FieldChange` describes one structural difference between two versions of
//! a tool instance's field list. Changes are transient: they are produced by a
//! comparison, classified into a `MigrationStrategy`, and consumed within the
//! same save action. They are never persisted.
//!
//! Changes are plain values with structural equality and hashing, so two
//! independently constructed changes describing the same fact are the same
//! map key in a [`StrategyMap`].

use crate::models::field::{FieldDefinition, FieldType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Numeric bound of a SCALE field
///
/// Compares numerically (`1 == 1.0`), unlike `serde_json::Number`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScaleBound(pub f64);

impl ScaleBound {
    fn canonical_bits(&self) -> u64 {
        // -0.0 == 0.0, so both must hash the same
        if self.0 == 0.0 {
            0.0f64.to_bits()
        } else {
            self.0.to_bits()
        }
    }
}

impl PartialEq for ScaleBound {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_bits() == other.canonical_bits()
    }
}

impl Eq for ScaleBound {}

impl Hash for ScaleBound {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_bits().hash(state);
    }
}

impl From<f64> for ScaleBound {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ScaleBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// One detected difference between an old and a new field list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldChange {
    /// A field exists only in the new list
    Added { field: FieldDefinition },

    /// A field exists only in the old list
    Removed { name: String },

    /// A field kept its identity but changed its name
    ///
    /// Never produced by the comparator: fields are joined by name, so a
    /// rename is observed as `Removed` + `Added`.
    NameChanged { old_name: String, new_name: String },

    /// A field changed its value type
    TypeChanged {
        name: String,
        old_type: FieldType,
        new_type: FieldType,
    },

    /// Options were dropped from a CHOICE field
    ChoiceOptionsRemoved {
        name: String,
        removed_options: Vec<String>,
    },

    /// The `[min, max]` range of a SCALE field changed
    ScaleRangeChanged {
        name: String,
        old_min: Option<ScaleBound>,
        old_max: Option<ScaleBound>,
        new_min: Option<ScaleBound>,
        new_max: Option<ScaleBound>,
    },

    /// A CHOICE field switched between single and multi-select
    ChoiceMultipleChanged {
        name: String,
        old_multiple: bool,
        new_multiple: bool,
    },

    /// Only display attributes changed
    CosmeticChange { name: String },
}

impl FieldChange {
    /// Convenience constructor for a scale change with all bounds known
    pub fn scale_range_changed(
        name: impl Into<String>,
        old_min: f64,
        old_max: f64,
        new_min: f64,
        new_max: f64,
    ) -> Self {
        Self::ScaleRangeChanged {
            name: name.into(),
            old_min: Some(old_min.into()),
            old_max: Some(old_max.into()),
            new_min: Some(new_min.into()),
            new_max: Some(new_max.into()),
        }
    }

    /// Name of the field this change is about
    ///
    /// For `NameChanged` this is the old name, i.e. the key stored entries
    /// still use.
    pub fn field_name(&self) -> &str {
        match self {
            FieldChange::Added { field } => &field.name,
            FieldChange::NameChanged { old_name, .. } => old_name,
            FieldChange::Removed { name }
            | FieldChange::TypeChanged { name, .. }
            | FieldChange::ChoiceOptionsRemoved { name, .. }
            | FieldChange::ScaleRangeChanged { name, .. }
            | FieldChange::ChoiceMultipleChanged { name, .. }
            | FieldChange::CosmeticChange { name } => name,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            FieldChange::Added { .. } => ChangeKind::Added,
            FieldChange::Removed { .. } => ChangeKind::Removed,
            FieldChange::NameChanged { .. } => ChangeKind::NameChanged,
            FieldChange::TypeChanged { .. } => ChangeKind::TypeChanged,
            FieldChange::ChoiceOptionsRemoved { .. } => ChangeKind::ChoiceOptionsRemoved,
            FieldChange::ScaleRangeChanged { .. } => ChangeKind::ScaleRangeChanged,
            FieldChange::ChoiceMultipleChanged { .. } => ChangeKind::ChoiceMultipleChanged,
            FieldChange::CosmeticChange { .. } => ChangeKind::CosmeticChange,
        }
    }
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: &Option<ScaleBound>| {
            b.map(|b| b.to_string())
                .unwrap_or_else(|| "?".to_string())
        };
        match self {
            FieldChange::Added { field } => write!(f, "added '{}'", field.name),
            FieldChange::Removed { name } => write!(f, "removed '{}'", name),
            FieldChange::NameChanged { old_name, new_name } => {
                write!(f, "renamed '{}' to '{}'", old_name, new_name)
            }
            FieldChange::TypeChanged {
                name,
                old_type,
                new_type,
            } => write!(f, "'{}' type {} -> {}", name, old_type, new_type),
            FieldChange::ChoiceOptionsRemoved {
                name,
                removed_options,
            } => write!(f, "'{}' options removed: {}", name, removed_options.join(", ")),
            FieldChange::ScaleRangeChanged {
                name,
                old_min,
                old_max,
                new_min,
                new_max,
            } => write!(
                f,
                "'{}' range [{}, {}] -> [{}, {}]",
                name,
                bound(old_min),
                bound(old_max),
                bound(new_min),
                bound(new_max)
            ),
            FieldChange::ChoiceMultipleChanged {
                name,
                old_multiple,
                new_multiple,
            } => write!(f, "'{}' multiple {} -> {}", name, old_multiple, new_multiple),
            FieldChange::CosmeticChange { name } => {
                write!(f, "'{}' display attributes changed", name)
            }
        }
    }
}

/// Variant tag of a [`FieldChange`], used for grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeKind {
    Added,
    Removed,
    NameChanged,
    TypeChanged,
    ChoiceOptionsRemoved,
    ScaleRangeChanged,
    ChoiceMultipleChanged,
    CosmeticChange,
}

/// Remediation applied to stored data for one change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationStrategy {
    /// Stored data stays valid as-is
    None,
    /// Delete the field's key from every entry
    StripField,
    /// Delete the field's key only from entries whose value is affected
    StripFieldIfValue,
    /// Reject the configuration change before anything is persisted
    Error,
}

impl MigrationStrategy {
    /// Whether this strategy rewrites stored entries
    pub fn touches_data(&self) -> bool {
        matches!(
            self,
            MigrationStrategy::StripField | MigrationStrategy::StripFieldIfValue
        )
    }
}

/// Strategy per change, keyed by the change value itself
pub type StrategyMap = HashMap<FieldChange, MigrationStrategy>;
