//! lesson-annotator - Annotation store and review API for lesson transcripts
//!
//! A reviewer browses transcribed lesson segments and attaches a categorical
//! judgment (category, subcategory, reasoning, confidence) to each one. The
//! judgments are persisted and later exported joined back to their source text.
//!
//! # Architecture
//!
//! - The catalog of lessons and segments is read-only and loaded once
//! - Annotations live in a store keyed by `"{lesson_id}_{segment_id}"`
//! - Saving replaces the whole record for a key; there is no history
//! - Views and exports read the catalog and the current store snapshot
//!
//! # Modules
//!
//! - `catalog`: Lesson index loading and consistency audit
//! - `core`: Annotation store, views, export join, application context
//! - `domain`: Data structures (Segment, Lesson, Annotation, SegmentKey)
//! - `api`: HTTP routes for the review UI
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Serve the review API on 127.0.0.1:5000
//! lesson-annotator serve
//!
//! # Export annotations with segment text
//! lesson-annotator export --output export.json
//! ```

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use catalog::{Catalog, CatalogAudit};
pub use crate::core::{AnnotationStore, AnnotatorContext, JsonFileStore, MemoryStore, StoreError};
pub use domain::{Annotation, AnnotationFields, Confidence, Lesson, Segment, SegmentKey};
