//! Lesson and segment views decorated with annotation state.
//!
//! Pure functions over a catalog and a store snapshot; callers decide which
//! snapshot to read.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::domain::{Annotation, AnnotationSnapshot, Segment, SegmentKey};

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Lesson not found: {0}")]
    LessonNotFound(String),
}

/// One row of the lesson list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonSummary {
    pub id: String,
    pub name: String,
    pub segment_count: usize,
    pub annotated_count: usize,
}

/// A segment with its current annotation, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentView {
    #[serde(flatten)]
    pub segment: Segment,

    pub annotation: Option<Annotation>,

    pub is_annotated: bool,
}

/// Keys `SegmentView` adds next to the segment's own fields
const VIEW_FIELDS: [&str; 2] = ["annotation", "is_annotated"];

/// All segments of a lesson with annotation state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonView {
    pub lesson_id: String,
    pub lesson_name: String,
    pub segments: Vec<SegmentView>,
}

/// Lessons in catalog order with how many of their segments are annotated
pub fn list_lessons(catalog: &Catalog, snapshot: &AnnotationSnapshot) -> Vec<LessonSummary> {
    catalog
        .lessons()
        .map(|lesson| {
            let annotated: HashSet<i64> = lesson
                .segments
                .iter()
                .map(|s| s.id)
                .filter(|&id| snapshot.contains_key(&SegmentKey::new(&lesson.id, id)))
                .collect();

            LessonSummary {
                id: lesson.id.clone(),
                name: lesson.name.clone(),
                segment_count: lesson.segment_count,
                annotated_count: annotated.len(),
            }
        })
        .collect()
}

/// Segments of one lesson decorated with their annotations
pub fn lesson_view(
    catalog: &Catalog,
    snapshot: &AnnotationSnapshot,
    lesson_id: &str,
) -> Result<LessonView, ViewError> {
    let lesson = catalog
        .lesson(lesson_id)
        .ok_or_else(|| ViewError::LessonNotFound(lesson_id.to_string()))?;

    let segments = lesson
        .segments
        .iter()
        .map(|segment| {
            let annotation = snapshot
                .get(&SegmentKey::new(&lesson.id, segment.id))
                .cloned();
            let mut segment = segment.clone();
            for field in VIEW_FIELDS {
                segment.extra.remove(field);
            }
            SegmentView {
                segment,
                is_annotated: annotation.is_some(),
                annotation,
            }
        })
        .collect();

    Ok(LessonView {
        lesson_id: lesson.id.clone(),
        lesson_name: lesson.name.clone(),
        segments,
    })
}
