//! Annotation store contract.
//!
//! A store maps [`SegmentKey`] to [`Annotation`] and exposes the whole mapping
//! as an ordered snapshot. Upserts replace the entry for a key outright; there
//! is no merge and no history.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{Annotation, AnnotationFields, AnnotationSnapshot, SegmentKey};

/// Errors that can occur in an annotation store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The persisted snapshot is missing or unreadable after initialization.
    /// Not retried.
    #[error("Annotation storage unavailable at {path}: {reason}")]
    StorageUnavailable { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Keyed annotation storage with atomic whole-record upsert
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// The full current snapshot, in first-creation order
    async fn load_all(&self) -> Result<AnnotationSnapshot, StoreError>;

    /// Same as [`load_all`](Self::load_all); used by bulk export
    async fn get_all(&self) -> Result<AnnotationSnapshot, StoreError> {
        self.load_all().await
    }

    /// The annotation stored under `key`, if any
    async fn get(&self, key: &SegmentKey) -> Result<Option<Annotation>, StoreError> {
        Ok(self.load_all().await?.get(key).cloned())
    }

    /// Replace the annotation for `(lesson_id, segment_id)` with `fields`,
    /// stamped with the save time. The change is durable before this returns.
    async fn upsert(
        &self,
        lesson_id: &str,
        segment_id: i64,
        fields: AnnotationFields,
    ) -> Result<Annotation, StoreError>;
}

/// Build the replacement record for a key, keeping its timestamp non-decreasing
pub(crate) fn replacement(
    snapshot: &AnnotationSnapshot,
    lesson_id: &str,
    segment_id: i64,
    fields: AnnotationFields,
) -> (SegmentKey, Annotation) {
    let key = SegmentKey::new(lesson_id, segment_id);
    let timestamp = save_time(snapshot.get(&key).map(|a| a.timestamp));
    let annotation = Annotation::new(lesson_id, segment_id, fields, timestamp);
    (key, annotation)
}

/// Current time, clamped so it never precedes the previous save
fn save_time(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(prev) if prev > now => prev,
        _ => now,
    }
}
