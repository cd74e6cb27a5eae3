//! Consistency report over the catalog documents.
//!
//! Ingestion is trusted to produce a well-formed catalog and nothing at
//! runtime re-validates it. The audit exists so an operator can check a new
//! data drop before serving it.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use super::index::Catalog;

/// A problem found in a single lesson
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LessonIssue {
    /// `segment_count` disagrees with the number of segments
    CountMismatch {
        lesson_id: String,
        declared: usize,
        actual: usize,
    },

    /// The same segment id appears more than once within a lesson
    DuplicateSegmentId { lesson_id: String, segment_id: i64 },

    /// Flattened document holds a different number of segments for the lesson
    FlattenedCountMismatch {
        lesson_id: String,
        index: usize,
        flattened: usize,
    },

    /// Flattened document references a lesson missing from the index
    UnknownLesson { lesson_id: String, segments: usize },
}

/// Result of auditing a catalog
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogAudit {
    pub lessons: usize,
    pub segments: usize,

    /// Total flattened segments, if that document was loaded
    pub flattened_segments: Option<usize>,

    pub issues: Vec<LessonIssue>,
}

impl CatalogAudit {
    /// True when no issues were found
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl Catalog {
    /// Check the catalog for internal inconsistencies
    pub fn audit(&self) -> CatalogAudit {
        let mut audit = CatalogAudit::default();

        for lesson in self.lessons() {
            audit.lessons += 1;
            audit.segments += lesson.segments.len();

            if lesson.segment_count != lesson.segments.len() {
                audit.issues.push(LessonIssue::CountMismatch {
                    lesson_id: lesson.id.clone(),
                    declared: lesson.segment_count,
                    actual: lesson.segments.len(),
                });
            }

            let mut seen = HashSet::new();
            let mut reported = HashSet::new();
            for segment in &lesson.segments {
                if !seen.insert(segment.id) && reported.insert(segment.id) {
                    audit.issues.push(LessonIssue::DuplicateSegmentId {
                        lesson_id: lesson.id.clone(),
                        segment_id: segment.id,
                    });
                }
            }
        }

        if let Some(flattened) = self.flattened() {
            audit.flattened_segments = Some(flattened.len());

            let mut per_lesson: HashMap<&str, usize> = HashMap::new();
            for flat in flattened {
                *per_lesson.entry(flat.lesson_id.as_str()).or_default() += 1;
            }

            for lesson in self.lessons() {
                let flat_count = per_lesson.remove(lesson.id.as_str()).unwrap_or(0);
                if flat_count != lesson.segments.len() {
                    audit.issues.push(LessonIssue::FlattenedCountMismatch {
                        lesson_id: lesson.id.clone(),
                        index: lesson.segments.len(),
                        flattened: flat_count,
                    });
                }
            }

            // Sorted so the report is stable between runs
            let unknown: BTreeMap<_, _> = per_lesson.into_iter().collect();
            for (lesson_id, segments) in unknown {
                audit.issues.push(LessonIssue::UnknownLesson {
                    lesson_id: lesson_id.to_string(),
                    segments,
                });
            }
        }

        audit
    }
}
