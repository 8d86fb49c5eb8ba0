//! ToolFields Core
//!
//! Custom-field definitions for tool instances and the migration engine that
//! keeps stored entries consistent when those definitions change.
//!
//! # Architecture
//!
//! - **Name as Identity**: Fields are joined by their immutable snake_case name
//! - **Pure Planning**: Comparison, policy and per-entry transforms never do I/O
//! - **Single Write**: A migration issues one bulk read and at most one bulk write
//! - **Merge Writes**: Deletions travel as explicit null sentinels
//!
//! # Modules
//!
//! - [`models`] - Field definitions, validation, changes and entry payloads
//! - [`services`] - Comparator, policy, migrator and the editor facade
//! - [`db`] - Entry store abstraction and in-memory implementation
//! - [`config`] - Migration tuning

pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::MigrationConfig;
pub use models::*;
pub use services::*;
