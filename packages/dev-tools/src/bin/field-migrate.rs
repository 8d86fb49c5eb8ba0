//! Field list migration for exported entries
//!
//! Runs the same check / confirm / execute flow as the field editor against
//! a JSON file of entries:
//!
//! ```text
//! field-migrate --old old_fields.json --new new_fields.json \
//!     --entries entries.json --tool-instance tracker-1 [--dry-run | --yes]
//! ```
//!
//! Exits non-zero when the edit is not allowed. Without `--yes` nothing is
//! written. Ctrl-C cancels a running migration before its write.
//!
//! Environment:
//! - `RUST_LOG` - log filter (default `info`)
//! - `TOOLFIELDS_LARGE_LOAD_WARNING` - entry count that triggers a warning
//! - `TOOLFIELDS_PARTIAL_VALIDATION` - relaxed validation on writes

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use toolfields_core::db::EntryStore;
use toolfields_core::models::FieldDefinition;
use toolfields_core::services::migration::{
    CancellationToken, FieldDataMigrator, FieldMigrationHelper, MigrationCheck,
};
use toolfields_core::MigrationConfig;
use toolfields_dev_tools::{DryRunReport, JsonFileStore};

#[derive(Parser, Debug)]
#[command(
    name = "field-migrate",
    version,
    about = "Migrate stored entries to a new custom field list"
)]
struct Args {
    /// Current field definitions (JSON array)
    #[arg(long)]
    old: PathBuf,

    /// Edited field definitions (JSON array)
    #[arg(long)]
    new: PathBuf,

    /// Entries file (JSON array), rewritten in place
    #[arg(long)]
    entries: PathBuf,

    /// Tool instance whose entries are migrated
    #[arg(long)]
    tool_instance: String,

    /// Apply the migration without further confirmation
    #[arg(long, conflicts_with = "dry_run")]
    yes: bool,

    /// Print the planned write payloads and exit
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let old_fields = read_fields(&args.old)?;
    let new_fields = read_fields(&args.new)?;

    let store = Arc::new(JsonFileStore::new(&args.entries));
    let migrator = FieldDataMigrator::with_config(store.clone(), MigrationConfig::from_env())?;
    let helper = FieldMigrationHelper::with_migrator(migrator);

    let (changes, strategies) = match helper.check_migration_needed(&old_fields, &new_fields) {
        MigrationCheck::NoMigration => {
            println!("No data migration required.");
            return Ok(());
        }
        MigrationCheck::Error { message } => bail!("{}", message),
        MigrationCheck::NeedsMigration {
            changes,
            strategies,
        } => (changes, strategies),
    };

    println!("{}", helper.get_description(&changes, &strategies));

    if args.dry_run {
        let entries = store.get_entries(&args.tool_instance).await?;
        let patches = helper.migrator().plan_entry_updates(
            &entries,
            &changes,
            &strategies,
            &CancellationToken::new(),
        )?;
        let report = DryRunReport::new(&args.tool_instance, entries.len(), &patches);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !args.yes {
        bail!("Nothing written. Re-run with --yes to apply, or --dry-run to preview");
    }

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling migration");
            ctrl_c_cancel.cancel();
        }
    });

    let outcome = helper
        .execute_migration(&args.tool_instance, &changes, &strategies, &cancel)
        .await?;

    println!(
        "Migrated {} of {} entries in {}",
        outcome.modified_count,
        outcome.total_count,
        store.path().display()
    );
    Ok(())
}

fn read_fields(path: &Path) -> Result<Vec<FieldDefinition>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read field definitions from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse field definitions from {}", path.display()))
}
