//! Service Layer Error Types
//!
//! Every failure of a migration collapses into [`MigrationError`]. Its
//! `Display` output is the user-facing message; nothing is thrown past the
//! service boundary.

use thiserror::Error;

/// Custom-field migration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    /// Cancellation was requested before the batch write was issued
    #[error("Migration cancelled")]
    Cancelled,

    /// The bulk read command failed
    #[error("Migration failed: could not load entries: {0}")]
    LoadFailed(String),

    /// The bulk write command failed
    #[error("Migration failed: could not update entries: {0}")]
    UpdateFailed(String),

    /// Migrator was constructed with an unusable configuration
    #[error("Migration failed: invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MigrationError {
    /// Create a load failed error
    pub fn load_failed(msg: impl Into<String>) -> Self {
        Self::LoadFailed(msg.into())
    }

    /// Create an update failed error
    pub fn update_failed(msg: impl Into<String>) -> Self {
        Self::UpdateFailed(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether this error is a user-initiated cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
