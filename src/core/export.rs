//! Export join: annotations re-attached to their source segments.
//!
//! Each snapshot entry is resolved back to its segment through its key. Entries
//! that no longer resolve produce no record; they are counted in
//! [`SkippedCounts`] instead.

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::domain::{Annotation, AnnotationSnapshot};

/// An annotation denormalized with its segment's content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRecord {
    #[serde(flatten)]
    pub annotation: Annotation,

    pub text: String,
    pub speaker: String,
    pub start_time: f64,
    pub end_time: f64,
    pub source_file: Option<String>,
}

/// Snapshot entries that did not make it into the export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkippedCounts {
    /// Key has no separator or a non-integer segment id
    pub malformed_key: usize,

    /// Lesson is not in the catalog
    pub missing_lesson: usize,

    /// Lesson exists but has no segment with that id
    pub missing_segment: usize,
}

impl SkippedCounts {
    pub fn total(&self) -> usize {
        self.malformed_key + self.missing_lesson + self.missing_segment
    }
}

/// Export records in snapshot order, plus what was dropped
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportReport {
    pub records: Vec<ExportRecord>,
    pub skipped: SkippedCounts,
}

/// Join every annotation in `snapshot` to its catalog segment
pub fn export_all(catalog: &Catalog, snapshot: &AnnotationSnapshot) -> ExportReport {
    let mut report = ExportReport::default();

    for (key, annotation) in snapshot.iter() {
        let Some((lesson_id, segment_id)) = key.split() else {
            debug!("Skipping export of malformed key {}", key);
            report.skipped.malformed_key += 1;
            continue;
        };

        let Some(lesson) = catalog.lesson(lesson_id) else {
            debug!("Skipping export of {}: lesson not in catalog", key);
            report.skipped.missing_lesson += 1;
            continue;
        };

        let Some(segment) = lesson.segment(segment_id) else {
            debug!("Skipping export of {}: segment not in lesson", key);
            report.skipped.missing_segment += 1;
            continue;
        };

        report.records.push(ExportRecord {
            annotation: annotation.clone(),
            text: segment.text.clone(),
            speaker: segment.speaker.clone(),
            start_time: segment.start_time,
            end_time: segment.end_time,
            source_file: segment.source_file.clone(),
        });
    }

    if report.skipped.total() > 0 {
        warn!(
            "Export dropped {} annotations (malformed key: {}, missing lesson: {}, missing segment: {})",
            report.skipped.total(),
            report.skipped.malformed_key,
            report.skipped.missing_lesson,
            report.skipped.missing_segment
        );
    }

    report
}
