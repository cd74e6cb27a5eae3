//! In-memory annotation store.
//!
//! Same contract as the file store without durability. Used for ephemeral
//! review sessions and tests.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use super::store::{replacement, AnnotationStore, StoreError};
use crate::domain::{Annotation, AnnotationFields, AnnotationSnapshot};

/// Mutex-guarded in-memory snapshot
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<AnnotationSnapshot>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnnotationStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load_all(&self) -> Result<AnnotationSnapshot, StoreError> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn upsert(
        &self,
        lesson_id: &str,
        segment_id: i64,
        fields: AnnotationFields,
    ) -> Result<Annotation, StoreError> {
        let mut snapshot = self.snapshot.lock().await;
        let (key, annotation) = replacement(&snapshot, lesson_id, segment_id, fields);
        snapshot.insert(key.clone(), annotation.clone());

        info!("Saved annotation {} (memory)", key);
        Ok(annotation)
    }
}
