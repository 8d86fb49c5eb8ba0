//! JSON File Entry Store
//!
//! [`EntryStore`] over a single JSON file holding an array of entries, as
//! exported from the app. Writes use the same merge semantics as the app's
//! batch command and replace the file atomically (temp file + rename), so an
//! interrupted run leaves either the old or the new file behind.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use toolfields_core::db::{
    apply_batch_update, BatchUpdateRequest, BatchUpdateResponse, EntryStore,
};
use toolfields_core::models::DataEntry;

pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every entry in the file, regardless of tool instance
    ///
    /// A missing file is an empty store.
    pub async fn load_all(&self) -> Result<Vec<DataEntry>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse entries from {}", self.path.display()))
    }

    async fn persist(&self, entries: &[DataEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.temp_path();

        tokio::fs::write(&tmp_path, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                tracing::warn!("Failed to remove {}: {}", tmp_path.display(), cleanup);
            }
            return Err(e).with_context(|| format!("Failed to replace {}", self.path.display()));
        }

        tracing::debug!("Persisted {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "entries.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl EntryStore for JsonFileStore {
    async fn get_entries(&self, tool_instance_id: &str) -> Result<Vec<DataEntry>> {
        let mut entries = self.load_all().await?;
        entries.retain(|entry| entry.tool_instance_id == tool_instance_id);
        Ok(entries)
    }

    async fn batch_update_entries(
        &self,
        request: BatchUpdateRequest,
    ) -> Result<BatchUpdateResponse> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load_all().await?;
        let response = apply_batch_update(&mut entries, &request)?;
        self.persist(&entries).await?;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use toolfields_core::db::UPDATED_AT_COLUMN;
    use toolfields_core::models::{EntryPatch, FieldPatch};

    async fn store_with(entries: serde_json::Value) -> (JsonFileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("entries.json");
        tokio::fs::write(&path, entries.to_string()).await.unwrap();
        (JsonFileStore::new(path), temp_dir)
    }

    fn request(entries: Vec<EntryPatch>) -> BatchUpdateRequest {
        BatchUpdateRequest {
            tool_instance_id: "tool-1".to_string(),
            entries,
            partial_validation: true,
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("absent.json"));
        assert!(store.get_entries("tool-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_entries_filters_by_tool_instance() {
        let (store, _dir) = store_with(json!([
            {"id": "e1", "toolInstanceId": "tool-1", "customFields": {"a": 1}},
            {"id": "e2", "toolInstanceId": "tool-2", "customFields": {"a": 2}},
        ]))
        .await;

        let entries = store.get_entries("tool-1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "e1");
    }

    #[tokio::test]
    async fn test_batch_update_persists_merge_and_keeps_columns() {
        let (store, _dir) = store_with(json!([
            {
                "id": "e1",
                "toolInstanceId": "tool-1",
                "customFields": "{\"a\":1,\"b\":2}",
                "value": 7
            },
            {"id": "e2", "toolInstanceId": "tool-2", "customFields": {"b": 2}},
        ]))
        .await;

        let mut patch = EntryPatch::new("e1");
        patch.custom_fields.insert("b".to_string(), FieldPatch::Delete);
        let response = store.batch_update_entries(request(vec![patch])).await.unwrap();
        assert_eq!(response.updated_count, 1);

        let reopened = JsonFileStore::new(store.path());
        let all = reopened.load_all().await.unwrap();
        assert_eq!(all[0].custom_fields, Some(json!({"a": 1})));
        assert_eq!(all[0].extra["value"], 7);
        assert!(all[0].extra.contains_key(UPDATED_AT_COLUMN));
        assert_eq!(all[1].custom_fields, Some(json!({"b": 2})));
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_rejected_batch_leaves_file_untouched() {
        let (store, _dir) = store_with(json!([
            {"id": "e1", "toolInstanceId": "tool-1", "customFields": {"a": 1}},
        ]))
        .await;
        let before = tokio::fs::read_to_string(store.path()).await.unwrap();

        let result = store
            .batch_update_entries(request(vec![EntryPatch::new("nope")]))
            .await;

        assert!(result.is_err());
        let after = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_failed_replace_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("entries.json");
        // A non-empty directory cannot be replaced by a file
        tokio::fs::create_dir(&path).await.unwrap();
        tokio::fs::write(path.join("keep"), "").await.unwrap();
        let store = JsonFileStore::new(&path);

        let err = store.persist(&[]).await.unwrap_err();

        assert!(err.to_string().contains("Failed to replace"));
        assert!(!store.temp_path().exists());
        assert!(path.join("keep").exists());
    }

    #[tokio::test]
    async fn test_malformed_file_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("entries.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let err = JsonFileStore::new(&path).get_entries("tool-1").await.unwrap_err();
        assert!(err.to_string().contains("entries.json"));
    }
}
