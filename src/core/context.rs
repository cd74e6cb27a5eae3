//! Application context shared by the CLI and the HTTP API.

use std::sync::Arc;

use thiserror::Error;

use super::export::{export_all, ExportReport};
use super::store::{AnnotationStore, StoreError};
use super::views::{lesson_view, list_lessons, LessonSummary, LessonView, ViewError};
use crate::catalog::Catalog;
use crate::domain::{Annotation, AnnotationFields, AnnotationSnapshot};

/// Errors surfaced by context operations
#[derive(Debug, Error)]
pub enum AnnotatorError {
    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Catalog and store handles, built once at startup and cloned per request
#[derive(Clone)]
pub struct AnnotatorContext {
    catalog: Arc<Catalog>,
    store: Arc<dyn AnnotationStore>,
}

impl AnnotatorContext {
    pub fn new(catalog: Catalog, store: Arc<dyn AnnotationStore>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            store,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &dyn AnnotationStore {
        self.store.as_ref()
    }

    /// Lesson list with annotated counts
    pub async fn list_lessons(&self) -> Result<Vec<LessonSummary>, AnnotatorError> {
        let snapshot = self.store.load_all().await?;
        Ok(list_lessons(&self.catalog, &snapshot))
    }

    /// One lesson's segments with annotation state
    pub async fn lesson_view(&self, lesson_id: &str) -> Result<LessonView, AnnotatorError> {
        // Unknown lessons are reported without touching storage
        if self.catalog.lesson(lesson_id).is_none() {
            return Err(ViewError::LessonNotFound(lesson_id.to_string()).into());
        }
        let snapshot = self.store.load_all().await?;
        Ok(lesson_view(&self.catalog, &snapshot, lesson_id)?)
    }

    /// Save (replace) the annotation for a segment.
    ///
    /// The lesson and segment are not checked against the catalog.
    pub async fn save_annotation(
        &self,
        lesson_id: &str,
        segment_id: i64,
        fields: AnnotationFields,
    ) -> Result<Annotation, AnnotatorError> {
        Ok(self.store.upsert(lesson_id, segment_id, fields).await?)
    }

    /// The full store snapshot
    pub async fn all_annotations(&self) -> Result<AnnotationSnapshot, AnnotatorError> {
        Ok(self.store.get_all().await?)
    }

    /// Export join over the current snapshot
    pub async fn export(&self) -> Result<ExportReport, AnnotatorError> {
        let snapshot = self.store.get_all().await?;
        Ok(export_all(&self.catalog, &snapshot))
    }
}
