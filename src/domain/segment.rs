//! Lesson and segment source records.
//!
//! These come from the ingestion step and are never mutated at runtime.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One transcribed utterance within a lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Unique within its lesson, not globally
    pub id: i64,

    pub text: String,

    pub speaker: String,

    /// Seconds from the start of the recording
    pub start_time: f64,

    pub end_time: f64,

    /// Transcript file the segment was cut from
    #[serde(default)]
    pub source_file: Option<String>,

    /// Any further ingestion fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Segment {
    /// Create a segment with no source file or extra fields
    pub fn new(
        id: i64,
        text: impl Into<String>,
        speaker: impl Into<String>,
        start_time: f64,
        end_time: f64,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            speaker: speaker.into(),
            start_time,
            end_time,
            source_file: None,
            extra: Map::new(),
        }
    }

    /// Set the source file
    pub fn with_source_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }
}

/// An ordered collection of segments.
///
/// In the lesson index document the id is the object key, so it is not part of
/// the serialized body and is filled in by the catalog after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(skip)]
    pub id: String,

    pub name: String,

    /// Equal to `segments.len()` when ingestion is correct; not re-validated here
    pub segment_count: usize,

    pub segments: Vec<Segment>,
}

impl Lesson {
    /// Create a lesson whose `segment_count` matches its segments
    pub fn new(id: impl Into<String>, name: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            segment_count: segments.len(),
            segments,
        }
    }

    /// First segment with the given id
    pub fn segment(&self, segment_id: i64) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == segment_id)
    }
}

/// Entry of the flattened segments document: a segment tagged with its lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatSegment {
    pub lesson_id: String,

    #[serde(flatten)]
    pub segment: Segment,
}
