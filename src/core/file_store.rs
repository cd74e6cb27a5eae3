//! Annotation store persisted as a single JSON document.
//!
//! Every read loads the whole snapshot and every upsert rewrites it. Writes go
//! to a temporary file in the same directory which is synced and then renamed
//! over the snapshot, so a crash mid-write leaves the previous snapshot intact.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::store::{replacement, AnnotationStore, StoreError};
use crate::domain::{Annotation, AnnotationFields, AnnotationSnapshot};

/// File-backed annotation store
pub struct JsonFileStore {
    /// Path to the snapshot document
    path: PathBuf,

    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating an empty snapshot if none exists
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };

        if let Some(parent) = store.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        if !store.path.exists() {
            info!("Creating empty annotation store at {}", store.path.display());
            store.persist(&AnnotationSnapshot::new()).await?;
        }

        Ok(store)
    }

    /// Get the path to the snapshot document
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl ToString) -> StoreError {
        StoreError::StorageUnavailable {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// Atomically replace the snapshot document
    async fn persist(&self, snapshot: &AnnotationSnapshot) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(snapshot)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, &content))
            .await
            .map_err(std::io::Error::other)??;

        debug!("Wrote {} annotations to {}", snapshot.len(), self.path.display());
        Ok(())
    }
}

fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl AnnotationStore for JsonFileStore {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn load_all(&self) -> Result<AnnotationSnapshot, StoreError> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.unavailable(e))?;

        serde_json::from_str(&content).map_err(|e| self.unavailable(e))
    }

    async fn upsert(
        &self,
        lesson_id: &str,
        segment_id: i64,
        fields: AnnotationFields,
    ) -> Result<Annotation, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut snapshot = self.load_all().await?;
        let (key, annotation) = replacement(&snapshot, lesson_id, segment_id, fields);
        snapshot.insert(key.clone(), annotation.clone());
        self.persist(&snapshot).await?;

        info!("Saved annotation {}", key);
        Ok(annotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SegmentKey;
    use tempfile::TempDir;

    async fn create_test_store() -> (JsonFileStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::open(temp.path().join("data").join("annotations.json"))
            .await
            .unwrap();
        (store, temp)
    }

    #[tokio::test]
    async fn test_open_creates_empty_snapshot() {
        let (store, _temp) = create_test_store().await;

        assert!(store.path().exists());
        let content = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.trim(), "{}");
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_keeps_existing_snapshot() {
        let (store, _temp) = create_test_store().await;
        store
            .upsert("L1", 1, AnnotationFields::default().with_category("a"))
            .await
            .unwrap();

        let reopened = JsonFileStore::open(store.path()).await.unwrap();
        assert_eq!(reopened.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_persists_pretty_object_keyed_by_segment_key() {
        let (store, _temp) = create_test_store().await;
        store
            .upsert("L1", 1, AnnotationFields::default().with_category("greeting"))
            .await
            .unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["L1_1"]["category"], "greeting");
        assert_eq!(value["L1_1"]["lesson_id"], "L1");
        assert_eq!(value["L1_1"]["segment_id"], 1);
        assert!(value["L1_1"]["subcategory"].is_null());
    }

    #[tokio::test]
    async fn test_upsert_replaces_without_merge() {
        let (store, _temp) = create_test_store().await;
        store
            .upsert(
                "L1",
                1,
                AnnotationFields::default()
                    .with_category("greeting")
                    .with_reasoning("says hello"),
            )
            .await
            .unwrap();
        store
            .upsert("L1", 1, AnnotationFields::default().with_category("question"))
            .await
            .unwrap();

        let snapshot = store.load_all().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        let annotation = snapshot.get("L1_1").unwrap();
        assert_eq!(annotation.category.as_deref(), Some("question"));
        assert_eq!(annotation.reasoning, None);
    }

    #[tokio::test]
    async fn test_get_single_key() {
        let (store, _temp) = create_test_store().await;
        store
            .upsert("L1", 2, AnnotationFields::default())
            .await
            .unwrap();

        assert!(store.get(&SegmentKey::new("L1", 2)).await.unwrap().is_some());
        assert!(store.get(&SegmentKey::new("L1", 3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_storage_unavailable() {
        let (store, _temp) = create_test_store().await;
        std::fs::remove_file(store.path()).unwrap();

        let err = store.load_all().await.unwrap_err();
        assert!(matches!(err, StoreError::StorageUnavailable { .. }));

        // Upsert must not silently recreate the snapshot
        let err = store
            .upsert("L1", 1, AnnotationFields::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::StorageUnavailable { .. }));
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_storage_unavailable() {
        let (store, _temp) = create_test_store().await;
        std::fs::write(store.path(), "{\"L1_1\": {").unwrap();

        let err = store.load_all().await.unwrap_err();
        assert!(matches!(err, StoreError::StorageUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_loads_snapshot_with_offsetless_timestamps() {
        let (store, _temp) = create_test_store().await;
        std::fs::write(
            store.path(),
            r#"{
  "L1_1": {
    "segment_id": 1,
    "lesson_id": "L1",
    "category": "greeting",
    "subcategory": null,
    "reasoning": null,
    "confidence": 0.9,
    "timestamp": "2024-05-01T10:11:12.123456"
  },
  "L1_2": {
    "segment_id": 2,
    "lesson_id": "L1",
    "category": null,
    "subcategory": null,
    "reasoning": null,
    "confidence": null,
    "timestamp": "2024-05-01T10:15:00"
  }
}"#,
        )
        .unwrap();

        let snapshot = store.load_all().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        let first = snapshot.get("L1_1").unwrap();
        assert_eq!(first.category.as_deref(), Some("greeting"));
        assert_eq!(
            first.timestamp.to_rfc3339(),
            "2024-05-01T10:11:12.123456+00:00"
        );

        // A later save still moves forward and rewrites the file in RFC 3339
        let saved = store
            .upsert("L1", 2, AnnotationFields::default().with_category("q"))
            .await
            .unwrap();
        assert!(saved.timestamp > snapshot.get("L1_2").unwrap().timestamp);
        let reloaded = store.load_all().await.unwrap();
        assert_eq!(reloaded.get("L1_1"), Some(first));
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let (store, _temp) = create_test_store().await;
        for i in 0..3 {
            store
                .upsert("L1", i, AnnotationFields::default())
                .await
                .unwrap();
        }

        let dir = store.path().parent().unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
