//! Custom Field Definitions
//!
//! Each tool instance carries an ordered list of user-defined fields. Stored
//! data entries reference those fields by `name`, which is the stable join key
//! between the schema and every persisted value.
//!
//! ## Example Field
//!
//! ```json
//! {
//!   "name": "mood",
//!   "displayName": "Mood",
//!   "type": "SCALE",
//!   "alwaysVisible": true,
//!   "config": { "min": 1, "max": 5 }
//! }
//! ```
//!
//! ## Mutability
//!
//! - `name` and `type` are fixed once the field exists
//! - `displayName`, `description` and `alwaysVisible` are cosmetic and never
//!   affect stored values
//! - `config` is type-dependent (`min`/`max` for SCALE, `options`/`multiple`
//!   for CHOICE)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Config key holding the lower bound of a SCALE field
pub const CONFIG_MIN: &str = "min";

/// Config key holding the upper bound of a SCALE field
pub const CONFIG_MAX: &str = "max";

/// Config key holding the option list of a CHOICE field
pub const CONFIG_OPTIONS: &str = "options";

/// Config key holding the multi-select flag of a CHOICE field
pub const CONFIG_MULTIPLE: &str = "multiple";

/// Value type of a custom field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    /// Single line of text
    TextShort,
    /// Multi-line text
    TextLong,
    /// Text without length limits
    TextUnlimited,
    /// Free numeric value
    Numeric,
    /// Number constrained to a `[min, max]` range
    Scale,
    /// One or more values picked from a fixed option list
    Choice,
    /// Yes/no flag
    Boolean,
    /// Calendar date (`YYYY-MM-DD`)
    Date,
    /// Time of day (`HH:MM`)
    Time,
    /// Date and time (RFC 3339)
    Datetime,
}

impl FieldType {
    /// Wire name of this type, as used in serialized definitions
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::TextShort => "TEXT_SHORT",
            FieldType::TextLong => "TEXT_LONG",
            FieldType::TextUnlimited => "TEXT_UNLIMITED",
            FieldType::Numeric => "NUMERIC",
            FieldType::Scale => "SCALE",
            FieldType::Choice => "CHOICE",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Date => "DATE",
            FieldType::Time => "TIME",
            FieldType::Datetime => "DATETIME",
        }
    }

    /// Whether values of this type are stored as strings of free text
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            FieldType::TextShort | FieldType::TextLong | FieldType::TextUnlimited
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Definition of a single custom field attached to a tool instance
///
/// Equality is structural over every attribute, config included. Hashing
/// covers every attribute except `config` (JSON values are not hashable),
/// which keeps `a == b => hash(a) == hash(b)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Stable snake_case identifier, referenced by every stored entry
    pub name: String,

    /// Label shown to the user
    pub display_name: String,

    /// Optional help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Value type (immutable after creation)
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Whether the field is shown even when it holds no value
    #[serde(default)]
    pub always_visible: bool,

    /// Type-dependent configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
}

impl Hash for FieldDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.display_name.hash(state);
        self.description.hash(state);
        self.field_type.hash(state);
        self.always_visible.hash(state);
    }
}

impl FieldDefinition {
    /// Create a field with no description, no config and default visibility
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: None,
            field_type,
            always_visible: false,
            config: None,
        }
    }

    /// Replace the config with the entries of a JSON object
    ///
    /// Non-object values clear the config.
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = match config {
            Value::Object(map) => Some(map),
            _ => None,
        };
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_always_visible(mut self, always_visible: bool) -> Self {
        self.always_visible = always_visible;
        self
    }

    /// Raw config value for `key`, if present
    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.config.as_ref().and_then(|config| config.get(key))
    }

    /// Numeric config value for `key`
    ///
    /// Accepts JSON numbers and numeric strings, since config editors are not
    /// consistent about how they write bounds. Non-finite values (`"NaN"`,
    /// `"inf"`) count as absent.
    pub fn config_number(&self, key: &str) -> Option<f64> {
        let number = match self.config_value(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }

    /// `(min, max)` of a SCALE field, each bound read independently
    pub fn scale_range(&self) -> (Option<f64>, Option<f64>) {
        (self.config_number(CONFIG_MIN), self.config_number(CONFIG_MAX))
    }

    /// Option list of a CHOICE field, in configured order
    ///
    /// Non-string entries are ignored.
    pub fn choice_options(&self) -> Vec<String> {
        self.config_value(CONFIG_OPTIONS)
            .and_then(|v| v.as_array())
            .map(|options| {
                options
                    .iter()
                    .filter_map(|o| o.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether a CHOICE field accepts several options (defaults to `false`)
    pub fn is_multiple(&self) -> bool {
        self.config_value(CONFIG_MULTIPLE)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Whether two definitions differ only in cosmetic attributes
    ///
    /// Returns `false` when nothing differs at all.
    pub fn differs_cosmetically(&self, other: &FieldDefinition) -> bool {
        self.name == other.name
            && self.field_type == other.field_type
            && self.config == other.config
            && (self.display_name != other.display_name
                || self.description != other.description
                || self.always_visible != other.always_visible)
    }
}
