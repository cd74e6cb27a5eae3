//! Core annotation logic.
//!
//! This module contains:
//! - AnnotationStore: Keyed annotation storage (file and memory backends)
//! - Views: Lesson list and lesson views decorated with annotation state
//! - Export: Annotations joined back to their source segments
//! - AnnotatorContext: Catalog + store handle passed to every caller

pub mod context;
pub mod export;
pub mod file_store;
pub mod memory_store;
pub mod store;
pub mod views;

// Re-export commonly used types
pub use context::{AnnotatorContext, AnnotatorError};
pub use export::{export_all, ExportRecord, ExportReport, SkippedCounts};
pub use file_store::JsonFileStore;
pub use memory_store::MemoryStore;
pub use store::{AnnotationStore, StoreError};
pub use views::{lesson_view, list_lessons, LessonSummary, LessonView, SegmentView, ViewError};
