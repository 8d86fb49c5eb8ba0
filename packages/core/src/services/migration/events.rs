//! Migration Events
//!
//! The migrator reports progress and recoverable problems through an injected
//! [`MigrationObserver`] instead of logging directly. Control flow never
//! depends on what an observer does with an event.
//!
//! - [`TracingObserver`] (default) forwards events to `tracing` at the
//!   event's level
//! - [`NoopObserver`] discards everything

use std::fmt;
use tracing::Level;

/// Checkpoint at which cancellation was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelStage {
    BeforeLoad,
    AfterLoad,
    DuringTransform,
    BeforeWrite,
}

impl fmt::Display for CancelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            CancelStage::BeforeLoad => "before loading entries",
            CancelStage::AfterLoad => "after loading entries",
            CancelStage::DuringTransform => "while transforming entries",
            CancelStage::BeforeWrite => "before writing entries",
        };
        f.write_str(stage)
    }
}

/// Something worth reporting during a migration
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationEvent {
    /// No change requires data rewriting; nothing was loaded
    NothingToMigrate { tool_instance_id: String },

    /// Entries were loaded for transformation
    EntriesLoaded {
        tool_instance_id: String,
        count: usize,
    },

    /// Unpaginated load exceeded the configured warning threshold
    LargeLoad {
        tool_instance_id: String,
        count: usize,
        threshold: usize,
    },

    /// An entry's custom-fields payload could not be parsed; it was skipped
    UnreadableEntry { entry_id: String, reason: String },

    /// A change carried a strategy the migrator cannot act on
    UnexpectedStrategy { change: String, strategy: String },

    /// An entry will be rewritten
    EntryModified {
        entry_id: String,
        removed_keys: Vec<String>,
    },

    /// Cancellation was observed at a checkpoint
    Cancelled { stage: CancelStage },

    /// Migration finished successfully
    Completed {
        tool_instance_id: String,
        modified_count: usize,
        total_count: usize,
    },

    /// Migration aborted
    Failed {
        tool_instance_id: String,
        message: String,
    },
}

impl MigrationEvent {
    /// Severity of this event
    pub fn level(&self) -> Level {
        match self {
            MigrationEvent::NothingToMigrate { .. } | MigrationEvent::EntryModified { .. } => {
                Level::DEBUG
            }
            MigrationEvent::EntriesLoaded { .. }
            | MigrationEvent::Cancelled { .. }
            | MigrationEvent::Completed { .. } => Level::INFO,
            MigrationEvent::LargeLoad { .. }
            | MigrationEvent::UnreadableEntry { .. }
            | MigrationEvent::UnexpectedStrategy { .. } => Level::WARN,
            MigrationEvent::Failed { .. } => Level::ERROR,
        }
    }
}

impl fmt::Display for MigrationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationEvent::NothingToMigrate { tool_instance_id } => write!(
                f,
                "No data migration required for tool instance {}",
                tool_instance_id
            ),
            MigrationEvent::EntriesLoaded {
                tool_instance_id,
                count,
            } => write!(
                f,
                "Loaded {} entries for tool instance {}",
                count, tool_instance_id
            ),
            MigrationEvent::LargeLoad {
                tool_instance_id,
                count,
                threshold,
            } => write!(
                f,
                "Loaded {} entries for tool instance {} in one batch (warning threshold {})",
                count, tool_instance_id, threshold
            ),
            MigrationEvent::UnreadableEntry { entry_id, reason } => write!(
                f,
                "Skipping entry {}: unreadable custom fields ({})",
                entry_id, reason
            ),
            MigrationEvent::UnexpectedStrategy { change, strategy } => write!(
                f,
                "Strategy {} reached the migrator for change {}; leaving data untouched",
                strategy, change
            ),
            MigrationEvent::EntryModified {
                entry_id,
                removed_keys,
            } => write!(
                f,
                "Entry {} loses fields: {}",
                entry_id,
                removed_keys.join(", ")
            ),
            MigrationEvent::Cancelled { stage } => write!(f, "Migration cancelled {}", stage),
            MigrationEvent::Completed {
                tool_instance_id,
                modified_count,
                total_count,
            } => write!(
                f,
                "Migrated tool instance {}: {} of {} entries modified",
                tool_instance_id, modified_count, total_count
            ),
            MigrationEvent::Failed {
                tool_instance_id,
                message,
            } => write!(
                f,
                "Migration of tool instance {} failed: {}",
                tool_instance_id, message
            ),
        }
    }
}

/// Sink for migration events
pub trait MigrationObserver: Send + Sync {
    fn on_event(&self, event: &MigrationEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl MigrationObserver for TracingObserver {
    fn on_event(&self, event: &MigrationEvent) {
        let level = event.level();
        if level == Level::ERROR {
            tracing::error!("{}", event);
        } else if level == Level::WARN {
            tracing::warn!("{}", event);
        } else if level == Level::INFO {
            tracing::info!("{}", event);
        } else if level == Level::DEBUG {
            tracing::debug!("{}", event);
        } else {
            tracing::trace!("{}", event);
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl MigrationObserver for NoopObserver {
    fn on_event(&self, _event: &MigrationEvent) {}
}
