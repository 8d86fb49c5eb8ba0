//! Field Data Migrator
//!
//! Rewrites the stored custom-field values of a tool instance so they stay
//! consistent with a new field list.
//!
//! ## Flow
//!
//! 1. Nothing to strip: return immediately without I/O
//! 2. Load every entry of the tool instance (one unpaginated read)
//! 3. Transform each entry's field map in memory, in change order
//! 4. Write all modified entries in one merge-semantics batch
//!
//! Cancellation is cooperative and polled before the load, after the load,
//! before each entry, and before the write. The batch write is the only
//! mutation, so a cancelled migration never leaves partial writes behind.
//!
//! ## Known Limits
//!
//! - No pagination: the whole entry set is held in memory
//! - No optimistic concurrency: a concurrent writer between the read and the
//!   write can be overwritten or merged unexpectedly

use crate::config::MigrationConfig;
use crate::db::{BatchUpdateRequest, EntryStore};
use crate::models::{DataEntry, EntryPatch, FieldChange, MigrationStrategy, StrategyMap};
use crate::services::error::MigrationError;
use crate::services::migration::events::{
    CancelStage, MigrationEvent, MigrationObserver, TracingObserver,
};
use crate::services::migration::policy::MigrationPolicy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Counts reported by a successful migration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationOutcome {
    /// Entries rewritten by the batch update
    pub modified_count: usize,

    /// Entries loaded for the tool instance
    pub total_count: usize,
}

/// Executes data migrations against an [`EntryStore`]
pub struct FieldDataMigrator {
    store: Arc<dyn EntryStore>,
    observer: Arc<dyn MigrationObserver>,
    config: MigrationConfig,
}

impl FieldDataMigrator {
    /// Create a migrator with default configuration, reporting to `tracing`
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self {
            store,
            observer: Arc::new(TracingObserver),
            config: MigrationConfig::default(),
        }
    }

    /// Create a migrator with an explicit configuration
    ///
    /// # Errors
    ///
    /// - `InvalidConfig`: configuration failed validation
    pub fn with_config(
        store: Arc<dyn EntryStore>,
        config: MigrationConfig,
    ) -> Result<Self, MigrationError> {
        config.validate().map_err(MigrationError::invalid_config)?;
        Ok(Self {
            config,
            ..Self::new(store)
        })
    }

    /// Replace the event observer
    pub fn with_observer(mut self, observer: Arc<dyn MigrationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Migrate the stored custom fields of `tool_instance_id`
    ///
    /// # Returns
    ///
    /// Number of modified and loaded entries. Both are zero when no change
    /// requires rewriting data.
    ///
    /// # Errors
    ///
    /// - `Cancelled`: `cancel` fired before the batch write
    /// - `LoadFailed`: the bulk read failed; nothing was written
    /// - `UpdateFailed`: the bulk write failed
    pub async fn migrate_custom_fields(
        &self,
        tool_instance_id: &str,
        changes: &[FieldChange],
        strategies: &StrategyMap,
        cancel: &CancellationToken,
    ) -> Result<MigrationOutcome, MigrationError> {
        let result = self.run(tool_instance_id, changes, strategies, cancel).await;

        match &result {
            Ok(outcome) => self.emit(MigrationEvent::Completed {
                tool_instance_id: tool_instance_id.to_string(),
                modified_count: outcome.modified_count,
                total_count: outcome.total_count,
            }),
            // Reported at the checkpoint that observed it
            Err(MigrationError::Cancelled) => {}
            Err(e) => self.emit(MigrationEvent::Failed {
                tool_instance_id: tool_instance_id.to_string(),
                message: e.to_string(),
            }),
        }

        result
    }

    async fn run(
        &self,
        tool_instance_id: &str,
        changes: &[FieldChange],
        strategies: &StrategyMap,
        cancel: &CancellationToken,
    ) -> Result<MigrationOutcome, MigrationError> {
        if !MigrationPolicy::requires_migration(strategies) {
            self.emit(MigrationEvent::NothingToMigrate {
                tool_instance_id: tool_instance_id.to_string(),
            });
            return Ok(MigrationOutcome::default());
        }

        self.checkpoint(cancel, CancelStage::BeforeLoad)?;

        let entries = self
            .store
            .get_entries(tool_instance_id)
            .await
            .map_err(|e| MigrationError::load_failed(e.to_string()))?;
        let total_count = entries.len();

        self.emit(MigrationEvent::EntriesLoaded {
            tool_instance_id: tool_instance_id.to_string(),
            count: total_count,
        });
        if total_count > self.config.large_load_warning_threshold {
            self.emit(MigrationEvent::LargeLoad {
                tool_instance_id: tool_instance_id.to_string(),
                count: total_count,
                threshold: self.config.large_load_warning_threshold,
            });
        }

        self.checkpoint(cancel, CancelStage::AfterLoad)?;

        let patches = self.plan_entry_updates(&entries, changes, strategies, cancel)?;

        self.checkpoint(cancel, CancelStage::BeforeWrite)?;

        if patches.is_empty() {
            return Ok(MigrationOutcome {
                modified_count: 0,
                total_count,
            });
        }

        let modified_count = patches.len();
        self.store
            .batch_update_entries(BatchUpdateRequest {
                tool_instance_id: tool_instance_id.to_string(),
                entries: patches,
                partial_validation: self.config.partial_validation,
            })
            .await
            .map_err(|e| MigrationError::update_failed(e.to_string()))?;

        Ok(MigrationOutcome {
            modified_count,
            total_count,
        })
    }

    /// Compute the write payloads for `entries` without touching the store
    ///
    /// Entries whose field map is unchanged, empty, or unreadable produce no
    /// patch. `cancel` is polled before each entry.
    pub fn plan_entry_updates(
        &self,
        entries: &[DataEntry],
        changes: &[FieldChange],
        strategies: &StrategyMap,
        cancel: &CancellationToken,
    ) -> Result<Vec<EntryPatch>, MigrationError> {
        self.report_unusable_strategies(changes, strategies);

        let mut patches = Vec::new();
        for entry in entries {
            self.checkpoint(cancel, CancelStage::DuringTransform)?;
            if let Some(patch) = self.transform_entry(entry, changes, strategies) {
                patches.push(patch);
            }
        }
        Ok(patches)
    }

    fn transform_entry(
        &self,
        entry: &DataEntry,
        changes: &[FieldChange],
        strategies: &StrategyMap,
    ) -> Option<EntryPatch> {
        let original = match entry.parsed_custom_fields() {
            Ok(fields) => fields,
            Err(reason) => {
                self.emit(MigrationEvent::UnreadableEntry {
                    entry_id: entry.id.clone(),
                    reason: reason.to_string(),
                });
                return None;
            }
        };

        if original.is_empty() {
            return None;
        }

        let mut fields = original.clone();
        for change in changes {
            let strategy = strategies
                .get(change)
                .copied()
                .unwrap_or(MigrationStrategy::None);
            apply_change(&mut fields, change, strategy);
        }

        if fields == original {
            return None;
        }

        let patch = EntryPatch::from_diff(entry.id.clone(), &original, &fields);
        self.emit(MigrationEvent::EntryModified {
            entry_id: entry.id.clone(),
            removed_keys: patch.deleted_keys().into_iter().map(str::to_string).collect(),
        });
        Some(patch)
    }

    /// Report strategies the transform step will ignore, once per change
    fn report_unusable_strategies(&self, changes: &[FieldChange], strategies: &StrategyMap) {
        for change in changes {
            let unusable = match strategies.get(change) {
                Some(MigrationStrategy::Error) => Some(MigrationStrategy::Error),
                Some(MigrationStrategy::StripFieldIfValue)
                    if !matches!(change, FieldChange::ChoiceOptionsRemoved { .. }) =>
                {
                    Some(MigrationStrategy::StripFieldIfValue)
                }
                _ => None,
            };
            if let Some(strategy) = unusable {
                self.emit(MigrationEvent::UnexpectedStrategy {
                    change: change.to_string(),
                    strategy: format!("{:?}", strategy),
                });
            }
        }
    }

    fn checkpoint(
        &self,
        cancel: &CancellationToken,
        stage: CancelStage,
    ) -> Result<(), MigrationError> {
        if cancel.is_cancelled() {
            self.emit(MigrationEvent::Cancelled { stage });
            return Err(MigrationError::Cancelled);
        }
        Ok(())
    }

    fn emit(&self, event: MigrationEvent) {
        self.observer.on_event(&event);
    }
}

/// Apply one change under its strategy to an entry's field map
fn apply_change(
    fields: &mut Map<String, Value>,
    change: &FieldChange,
    strategy: MigrationStrategy,
) {
    match strategy {
        MigrationStrategy::StripField => {
            fields.remove(change.field_name());
        }
        MigrationStrategy::StripFieldIfValue => {
            if let FieldChange::ChoiceOptionsRemoved {
                name,
                removed_options,
            } = change
            {
                let affected = fields
                    .get(name)
                    .is_some_and(|value| references_any(value, removed_options));
                if affected {
                    fields.remove(name);
                }
            }
        }
        MigrationStrategy::None | MigrationStrategy::Error => {}
    }
}

/// Whether a stored choice value selects any of `options`
///
/// Single-select values are strings; multi-select values are lists of strings.
fn references_any(value: &Value, options: &[String]) -> bool {
    let is_removed = |selected: &Value| {
        selected
            .as_str()
            .is_some_and(|s| options.iter().any(|option| option == s))
    };
    match value {
        Value::Array(selected) => selected.iter().any(is_removed),
        other => is_removed(other),
    }
}
