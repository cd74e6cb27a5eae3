//! Lesson index loading and lookup.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::fs;
use tracing::info;

use crate::domain::{FlatSegment, Lesson};

/// Errors raised while loading the catalog documents
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Immutable collection of lessons in ingestion order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    lessons: IndexMap<String, Lesson>,

    /// Flattened segments document, when one was supplied
    flattened: Option<Vec<FlatSegment>>,
}

impl Catalog {
    /// Build a catalog from lessons already in memory
    pub fn from_lessons(lessons: impl IntoIterator<Item = Lesson>) -> Self {
        Self {
            lessons: lessons.into_iter().map(|l| (l.id.clone(), l)).collect(),
            flattened: None,
        }
    }

    /// Attach a flattened segments list
    pub fn with_flattened(mut self, flattened: Vec<FlatSegment>) -> Self {
        self.flattened = Some(flattened);
        self
    }

    /// Load the lesson index and, if present, the flattened segments document
    pub async fn load(lesson_index_path: &Path, segments_path: &Path) -> Result<Self, CatalogError> {
        let mut lessons: IndexMap<String, Lesson> = read_json(lesson_index_path).await?;
        for (id, lesson) in lessons.iter_mut() {
            lesson.id = id.clone();
        }

        let flattened = if segments_path.exists() {
            Some(read_json::<Vec<FlatSegment>>(segments_path).await?)
        } else {
            info!(
                "No flattened segments file at {}, skipping",
                segments_path.display()
            );
            None
        };

        info!(
            "Loaded catalog: {} lessons, {} segments",
            lessons.len(),
            lessons.values().map(|l| l.segments.len()).sum::<usize>()
        );

        Ok(Self { lessons, flattened })
    }

    /// Look up a lesson by id
    pub fn lesson(&self, id: &str) -> Option<&Lesson> {
        self.lessons.get(id)
    }

    /// All lessons in ingestion order
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.lessons.values()
    }

    /// The flattened segments document, if one was loaded
    pub fn flattened(&self) -> Option<&[FlatSegment]> {
        self.flattened.as_deref()
    }

    /// Get the number of lessons
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
