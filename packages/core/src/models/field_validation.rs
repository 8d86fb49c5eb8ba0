//! Field Definition and Value Validation
//!
//! Validates custom field definitions produced by config editors, and stored
//! values against the definition they belong to.

use crate::models::field::{
    FieldDefinition, FieldType, CONFIG_MAX, CONFIG_MIN, CONFIG_MULTIPLE, CONFIG_OPTIONS,
};
use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;

/// Maximum length of a field name
pub const MAX_FIELD_NAME_LENGTH: usize = 64;

/// Minimum number of options a CHOICE field must offer
pub const MIN_CHOICE_OPTIONS: usize = 2;

const FIELD_NAME_PATTERN: &str = r"^[a-z][a-z0-9_]*$";

/// Validation failures for field definitions and stored values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldValidationError {
    #[error(
        "Invalid field name '{0}': must be snake_case (lowercase letters, digits, \
         underscores) and start with a letter"
    )]
    InvalidName(String),

    #[error("Field name '{name}' exceeds {max} characters")]
    NameTooLong { name: String, max: usize },

    #[error("Field '{0}' must have a display name")]
    MissingDisplayName(String),

    #[error("Duplicate field name: {0}")]
    DuplicateName(String),

    #[error("Invalid config for field '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl FieldValidationError {
    fn invalid_config(field: &FieldDefinition, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.name.clone(),
            reason: reason.into(),
        }
    }

    fn invalid_value(field: &FieldDefinition, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.name.clone(),
            reason: reason.into(),
        }
    }
}

/// Stateless validator for custom field definitions and values
pub struct FieldValidator;

impl FieldValidator {
    /// Validate a single field definition
    ///
    /// # Errors
    ///
    /// - `InvalidName` / `NameTooLong`: name is not a usable snake_case identifier
    /// - `MissingDisplayName`: display name is blank
    /// - `InvalidConfig`: type-dependent config is missing or malformed
    pub fn validate_definition(field: &FieldDefinition) -> Result<(), FieldValidationError> {
        static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
        let name_regex = NAME_REGEX.get_or_init(|| Regex::new(FIELD_NAME_PATTERN).unwrap());

        if !name_regex.is_match(&field.name) {
            return Err(FieldValidationError::InvalidName(field.name.clone()));
        }

        if field.name.len() > MAX_FIELD_NAME_LENGTH {
            return Err(FieldValidationError::NameTooLong {
                name: field.name.clone(),
                max: MAX_FIELD_NAME_LENGTH,
            });
        }

        if field.display_name.trim().is_empty() {
            return Err(FieldValidationError::MissingDisplayName(field.name.clone()));
        }

        match field.field_type {
            FieldType::Scale => Self::validate_scale_config(field),
            FieldType::Choice => Self::validate_choice_config(field),
            _ => Ok(()),
        }
    }

    /// Validate a complete field list: every definition valid, names unique
    pub fn validate_definitions(fields: &[FieldDefinition]) -> Result<(), FieldValidationError> {
        let mut seen = HashSet::new();
        for field in fields {
            Self::validate_definition(field)?;
            if !seen.insert(field.name.as_str()) {
                return Err(FieldValidationError::DuplicateName(field.name.clone()));
            }
        }
        Ok(())
    }

    fn validate_scale_config(field: &FieldDefinition) -> Result<(), FieldValidationError> {
        let min = field.config_number(CONFIG_MIN).ok_or_else(|| {
            FieldValidationError::invalid_config(field, "SCALE requires a numeric 'min'")
        })?;
        let max = field.config_number(CONFIG_MAX).ok_or_else(|| {
            FieldValidationError::invalid_config(field, "SCALE requires a numeric 'max'")
        })?;

        if min >= max {
            return Err(FieldValidationError::invalid_config(
                field,
                format!("'min' ({}) must be less than 'max' ({})", min, max),
            ));
        }
        Ok(())
    }

    fn validate_choice_config(field: &FieldDefinition) -> Result<(), FieldValidationError> {
        let options = field
            .config_value(CONFIG_OPTIONS)
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                FieldValidationError::invalid_config(field, "CHOICE requires an 'options' list")
            })?;

        if options.len() < MIN_CHOICE_OPTIONS {
            return Err(FieldValidationError::invalid_config(
                field,
                format!("CHOICE requires at least {} options", MIN_CHOICE_OPTIONS),
            ));
        }

        let mut seen = HashSet::new();
        for option in options {
            let option = option.as_str().ok_or_else(|| {
                FieldValidationError::invalid_config(field, "options must be strings")
            })?;
            if option.trim().is_empty() {
                return Err(FieldValidationError::invalid_config(
                    field,
                    "options must not be blank",
                ));
            }
            if !seen.insert(option) {
                return Err(FieldValidationError::invalid_config(
                    field,
                    format!("duplicate option '{}'", option),
                ));
            }
        }

        if let Some(multiple) = field.config_value(CONFIG_MULTIPLE) {
            if !multiple.is_boolean() {
                return Err(FieldValidationError::invalid_config(
                    field,
                    "'multiple' must be a boolean",
                ));
            }
        }

        Ok(())
    }

    /// Validate a stored value against its field definition
    ///
    /// `null` is accepted for every type and means "no value".
    pub fn validate_value(
        field: &FieldDefinition,
        value: &Value,
    ) -> Result<(), FieldValidationError> {
        if value.is_null() {
            return Ok(());
        }

        match field.field_type {
            FieldType::TextShort | FieldType::TextLong | FieldType::TextUnlimited => {
                if !value.is_string() {
                    return Err(FieldValidationError::invalid_value(field, "expected text"));
                }
            }
            FieldType::Numeric => {
                if !value.is_number() {
                    return Err(FieldValidationError::invalid_value(field, "expected a number"));
                }
            }
            FieldType::Scale => {
                let number = value.as_f64().ok_or_else(|| {
                    FieldValidationError::invalid_value(field, "expected a number")
                })?;
                let (min, max) = field.scale_range();
                if min.is_some_and(|min| number < min) || max.is_some_and(|max| number > max) {
                    return Err(FieldValidationError::invalid_value(
                        field,
                        format!("{} is outside the configured range", number),
                    ));
                }
            }
            FieldType::Choice => Self::validate_choice_value(field, value)?,
            FieldType::Boolean => {
                if !value.is_boolean() {
                    return Err(FieldValidationError::invalid_value(
                        field,
                        "expected true or false",
                    ));
                }
            }
            FieldType::Date => {
                let text = Self::expect_str(field, value)?;
                NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| {
                    FieldValidationError::invalid_value(field, "expected a YYYY-MM-DD date")
                })?;
            }
            FieldType::Time => {
                let text = Self::expect_str(field, value)?;
                NaiveTime::parse_from_str(text, "%H:%M")
                    .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
                    .map_err(|_| {
                        FieldValidationError::invalid_value(field, "expected an HH:MM time")
                    })?;
            }
            FieldType::Datetime => {
                let text = Self::expect_str(field, value)?;
                DateTime::parse_from_rfc3339(text).map_err(|_| {
                    FieldValidationError::invalid_value(field, "expected an RFC 3339 timestamp")
                })?;
            }
        }

        Ok(())
    }

    fn validate_choice_value(
        field: &FieldDefinition,
        value: &Value,
    ) -> Result<(), FieldValidationError> {
        let options = field.choice_options();
        let check_option = |option: &Value| -> Result<(), FieldValidationError> {
            let option = option.as_str().ok_or_else(|| {
                FieldValidationError::invalid_value(field, "choice values must be strings")
            })?;
            if !options.iter().any(|o| o == option) {
                return Err(FieldValidationError::invalid_value(
                    field,
                    format!("'{}' is not one of the configured options", option),
                ));
            }
            Ok(())
        };

        if field.is_multiple() {
            let selected = value.as_array().ok_or_else(|| {
                FieldValidationError::invalid_value(field, "multi-select values must be a list")
            })?;
            selected.iter().try_for_each(check_option)
        } else {
            if value.is_array() {
                return Err(FieldValidationError::invalid_value(
                    field,
                    "single-select values must not be a list",
                ));
            }
            check_option(value)
        }
    }

    fn expect_str<'a>(
        field: &FieldDefinition,
        value: &'a Value,
    ) -> Result<&'a str, FieldValidationError> {
        value
            .as_str()
            .ok_or_else(|| FieldValidationError::invalid_value(field, "expected text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scale(min: Value, max: Value) -> FieldDefinition {
        FieldDefinition::new("mood", "Mood", FieldType::Scale)
            .with_config(json!({"min": min, "max": max}))
    }

    fn choice(options: Value, multiple: bool) -> FieldDefinition {
        FieldDefinition::new("color", "Color", FieldType::Choice)
            .with_config(json!({"options": options, "multiple": multiple}))
    }

    #[test]
    fn test_valid_definitions_pass() {
        let fields = vec![
            FieldDefinition::new("notes", "Notes", FieldType::TextLong),
            scale(json!(1), json!(5)),
            choice(json!(["red", "blue"]), false),
        ];
        assert!(FieldValidator::validate_definitions(&fields).is_ok());
    }

    #[test]
    fn test_name_must_be_snake_case() {
        for bad in ["", "Mood", "my-field", "2nd", "_hidden", "with space"] {
            let field = FieldDefinition::new(bad, "Label", FieldType::Numeric);
            assert!(
                matches!(
                    FieldValidator::validate_definition(&field),
                    Err(FieldValidationError::InvalidName(_))
                ),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_name_length_limit() {
        let long_name = "a".repeat(MAX_FIELD_NAME_LENGTH + 1);
        let field = FieldDefinition::new(long_name, "Label", FieldType::Numeric);
        assert!(matches!(
            FieldValidator::validate_definition(&field),
            Err(FieldValidationError::NameTooLong { .. })
        ));
    }

    #[test]
    fn test_blank_display_name_rejected() {
        let field = FieldDefinition::new("notes", "   ", FieldType::TextShort);
        assert_eq!(
            FieldValidator::validate_definition(&field),
            Err(FieldValidationError::MissingDisplayName("notes".to_string()))
        );
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let fields = vec![
            FieldDefinition::new("notes", "Notes", FieldType::TextShort),
            FieldDefinition::new("notes", "More notes", FieldType::TextLong),
        ];
        assert_eq!(
            FieldValidator::validate_definitions(&fields),
            Err(FieldValidationError::DuplicateName("notes".to_string()))
        );
    }

    #[test]
    fn test_scale_config_rules() {
        assert!(FieldValidator::validate_definition(&scale(json!(1), json!(10))).is_ok());
        assert!(FieldValidator::validate_definition(&scale(json!("0"), json!("3"))).is_ok());
        assert!(FieldValidator::validate_definition(&scale(json!(5), json!(5))).is_err());
        assert!(FieldValidator::validate_definition(&scale(json!("low"), json!(5))).is_err());

    }

    #[test]
    fn test_non_finite_scale_bounds_rejected() {
        for (min, max) in [
            (json!("NaN"), json!(5)),
            (json!(1), json!("nan")),
            (json!("-inf"), json!(5)),
            (json!(1), json!("Infinity")),
        ] {
            let field = scale(min.clone(), max.clone());
            assert!(
                matches!(
                    FieldValidator::validate_definition(&field),
                    Err(FieldValidationError::InvalidConfig { .. })
                ),
                "min {} max {}",
                min,
                max
            );
        }
    }

    #[test]
    fn test_scale_config_requires_bounds() {
        let unconfigured = FieldDefinition::new("mood", "Mood", FieldType::Scale);
        assert!(matches!(
            FieldValidator::validate_definition(&unconfigured),
            Err(FieldValidationError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_choice_config_rules() {
        assert!(FieldValidator::validate_definition(&choice(json!(["a", "b"]), true)).is_ok());
        assert!(FieldValidator::validate_definition(&choice(json!(["a"]), false)).is_err());
        assert!(FieldValidator::validate_definition(&choice(json!(["a", "a"]), false)).is_err());
        assert!(FieldValidator::validate_definition(&choice(json!(["a", " "]), false)).is_err());
        assert!(FieldValidator::validate_definition(&choice(json!(["a", 2]), false)).is_err());

        let bad_multiple = FieldDefinition::new("color", "Color", FieldType::Choice)
            .with_config(json!({"options": ["a", "b"], "multiple": "yes"}));
        assert!(FieldValidator::validate_definition(&bad_multiple).is_err());
    }

    #[test]
    fn test_validate_value_by_type() {
        let text = FieldDefinition::new("notes", "Notes", FieldType::TextShort);
        assert!(FieldValidator::validate_value(&text, &json!("hello")).is_ok());
        assert!(FieldValidator::validate_value(&text, &json!(3)).is_err());

        let numeric = FieldDefinition::new("weight", "Weight", FieldType::Numeric);
        assert!(FieldValidator::validate_value(&numeric, &json!(72.5)).is_ok());
        assert!(FieldValidator::validate_value(&numeric, &json!("72")).is_err());

        let flag = FieldDefinition::new("done", "Done", FieldType::Boolean);
        assert!(FieldValidator::validate_value(&flag, &json!(true)).is_ok());
        assert!(FieldValidator::validate_value(&flag, &json!("true")).is_err());

        let date = FieldDefinition::new("day", "Day", FieldType::Date);
        assert!(FieldValidator::validate_value(&date, &json!("2024-02-29")).is_ok());
        assert!(FieldValidator::validate_value(&date, &json!("2023-02-29")).is_err());

        let time = FieldDefinition::new("at", "At", FieldType::Time);
        assert!(FieldValidator::validate_value(&time, &json!("07:30")).is_ok());
        assert!(FieldValidator::validate_value(&time, &json!("07:30:15")).is_ok());
        assert!(FieldValidator::validate_value(&time, &json!("25:00")).is_err());

        let stamp = FieldDefinition::new("when", "When", FieldType::Datetime);
        assert!(FieldValidator::validate_value(&stamp, &json!("2024-05-01T10:00:00Z")).is_ok());
        assert!(FieldValidator::validate_value(&stamp, &json!("yesterday")).is_err());
    }

    #[test]
    fn test_null_is_always_accepted() {
        let field = scale(json!(1), json!(5));
        assert!(FieldValidator::validate_value(&field, &Value::Null).is_ok());
    }

    #[test]
    fn test_scale_value_must_be_in_range() {
        let field = scale(json!(1), json!(5));
        assert!(FieldValidator::validate_value(&field, &json!(4)).is_ok());
        assert!(FieldValidator::validate_value(&field, &json!(8)).is_err());
        assert!(FieldValidator::validate_value(&field, &json!(0.5)).is_err());
    }

    #[test]
    fn test_choice_value_shape_follows_multiple_flag() {
        let single = choice(json!(["red", "blue"]), false);
        assert!(FieldValidator::validate_value(&single, &json!("red")).is_ok());
        assert!(FieldValidator::validate_value(&single, &json!("green")).is_err());
        assert!(FieldValidator::validate_value(&single, &json!(["red"])).is_err());

        let multi = choice(json!(["red", "blue"]), true);
        assert!(FieldValidator::validate_value(&multi, &json!(["red", "blue"])).is_ok());
        assert!(FieldValidator::validate_value(&multi, &json!("red")).is_err());
        assert!(FieldValidator::validate_value(&multi, &json!(["red", "green"])).is_err());
    }
}
