//! Read-only lesson/segment catalog.
//!
//! The catalog is produced by a separate ingestion step and loaded once at
//! startup. Nothing at runtime mutates it.
//!
//! # Storage Layout
//!
//! ```text
//! <data_dir>/
//! ├── lesson_index.json         # { lesson_id: {name, segment_count, segments} }
//! ├── segments_flattened.json   # [ {lesson_id, id, text, ...} ]  (optional)
//! └── annotations.json          # annotation store snapshot
//! ```

pub mod audit;
pub mod index;

pub use audit::{CatalogAudit, LessonIssue};
pub use index::{Catalog, CatalogError};
