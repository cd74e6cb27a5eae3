//! Domain types for the lesson annotator.
//!
//! This module contains the core data structures:
//! - Segment/Lesson: Immutable source records from ingestion
//! - Annotation: Reviewer judgments keyed by SegmentKey

pub mod annotation;
pub mod segment;

// Re-export commonly used types
pub use annotation::{
    Annotation, AnnotationFields, AnnotationSnapshot, Confidence, SegmentKey, KEY_SEPARATOR,
};
pub use segment::{FlatSegment, Lesson, Segment};
