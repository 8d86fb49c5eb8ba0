/// Configuration for custom-field data migrations
use serde::{Deserialize, Serialize};

/// Environment variable overriding `large_load_warning_threshold`
pub const ENV_LARGE_LOAD_WARNING: &str = "TOOLFIELDS_LARGE_LOAD_WARNING";

/// Environment variable overriding `partial_validation`
pub const ENV_PARTIAL_VALIDATION: &str = "TOOLFIELDS_PARTIAL_VALIDATION";

/// Tuning knobs for [`FieldDataMigrator`](crate::services::migration::FieldDataMigrator)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Entry count above which an unpaginated load is reported as a warning
    pub large_load_warning_threshold: usize,

    /// Ask the write command for relaxed validation (only the patched keys
    /// are checked against the schema)
    pub partial_validation: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            large_load_warning_threshold: 5000,
            partial_validation: true,
        }
    }
}

impl MigrationConfig {
    /// Defaults overridden by environment variables, when set and parseable
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(threshold) = std::env::var(ENV_LARGE_LOAD_WARNING)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            config.large_load_warning_threshold = threshold;
        }

        if let Some(partial) = std::env::var(ENV_PARTIAL_VALIDATION)
            .ok()
            .and_then(|v| parse_bool(&v))
        {
            config.partial_validation = partial;
        }

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.large_load_warning_threshold == 0 {
            return Err("large_load_warning_threshold must be greater than 0".to_string());
        }

        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
