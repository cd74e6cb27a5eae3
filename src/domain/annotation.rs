//! Annotation records and their segment keys.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Separator between lesson id and segment id in a [`SegmentKey`]
pub const KEY_SEPARATOR: char = '_';

/// Composite identity of a segment: `"{lesson_id}_{segment_id}"`.
///
/// Lesson ids may themselves contain `_`, so the key is always split on the
/// last separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentKey(String);

impl SegmentKey {
    /// Build the key for a segment
    pub fn new(lesson_id: &str, segment_id: i64) -> Self {
        Self(format!("{}{}{}", lesson_id, KEY_SEPARATOR, segment_id))
    }

    /// Split back into `(lesson_id, segment_id)`.
    ///
    /// Returns `None` when there is no separator or the suffix is not an integer.
    pub fn split(&self) -> Option<(&str, i64)> {
        let (lesson_id, segment_id) = self.0.rsplit_once(KEY_SEPARATOR)?;
        let segment_id = segment_id.parse().ok()?;
        Some((lesson_id, segment_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SegmentKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SegmentKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::borrow::Borrow<str> for SegmentKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Reviewer confidence, either a numeric score or a free-form label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    Score(f64),
    Label(String),
}

impl From<f64> for Confidence {
    fn from(score: f64) -> Self {
        Confidence::Score(score)
    }
}

impl From<&str> for Confidence {
    fn from(label: &str) -> Self {
        Confidence::Label(label.to_string())
    }
}

/// Reviewer-supplied part of an annotation.
///
/// Every field is optional and nothing is validated; absent fields are stored
/// as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationFields {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub reasoning: Option<String>,
    pub confidence: Option<Confidence>,
}

impl AnnotationFields {
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn with_confidence(mut self, confidence: impl Into<Confidence>) -> Self {
        self.confidence = Some(confidence.into());
        self
    }
}

/// A reviewer's judgment on one segment.
///
/// At most one exists per [`SegmentKey`]; saving again replaces it entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub segment_id: i64,

    pub lesson_id: String,

    pub category: Option<String>,

    pub subcategory: Option<String>,

    pub reasoning: Option<String>,

    pub confidence: Option<Confidence>,

    /// Time of the most recent save
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Layout of offset-less timestamps in older snapshots
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Read RFC 3339, or a naive local timestamp taken as UTC
fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(&raw, NAIVE_TIMESTAMP_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
}

impl Annotation {
    /// Build an annotation from reviewer fields
    pub fn new(
        lesson_id: impl Into<String>,
        segment_id: i64,
        fields: AnnotationFields,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            segment_id,
            lesson_id: lesson_id.into(),
            category: fields.category,
            subcategory: fields.subcategory,
            reasoning: fields.reasoning,
            confidence: fields.confidence,
            timestamp,
        }
    }

    /// Key this annotation is stored under
    pub fn key(&self) -> SegmentKey {
        SegmentKey::new(&self.lesson_id, self.segment_id)
    }

    /// The reviewer-supplied fields, without identity or timestamp
    pub fn fields(&self) -> AnnotationFields {
        AnnotationFields {
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
            reasoning: self.reasoning.clone(),
            confidence: self.confidence.clone(),
        }
    }
}

/// The entire persisted store state, in first-creation order.
///
/// Re-inserting an existing key replaces the value without moving it.
pub type AnnotationSnapshot = IndexMap<SegmentKey, Annotation>;
