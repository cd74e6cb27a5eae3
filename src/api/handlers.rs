//! HTTP request handlers
//!
//! Thin wrappers over [`AnnotatorContext`]; all behavior lives in `core`.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderName,
    Json,
};
use serde::Serialize;

use super::error::{ApiError, ApiResult};
use crate::core::{AnnotatorContext, ExportRecord, LessonSummary, LessonView};
use crate::domain::{AnnotationFields, AnnotationSnapshot, SegmentKey};

/// Response header carrying how many annotations the export dropped
pub const EXPORT_SKIPPED_HEADER: HeaderName = HeaderName::from_static("x-export-skipped");

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    status: String,
    segment_key: SegmentKey,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/lessons
pub async fn list_lessons(
    State(ctx): State<AnnotatorContext>,
) -> ApiResult<Json<Vec<LessonSummary>>> {
    Ok(Json(ctx.list_lessons().await?))
}

/// GET /api/lesson/:lesson_id
pub async fn get_lesson(
    State(ctx): State<AnnotatorContext>,
    Path(lesson_id): Path<String>,
) -> ApiResult<Json<LessonView>> {
    Ok(Json(ctx.lesson_view(&lesson_id).await?))
}

/// POST /api/annotation/:lesson_id/:segment_id
///
/// The body is a JSON object of annotation fields. Missing fields, and a
/// missing body, are stored as null.
pub async fn save_annotation(
    State(ctx): State<AnnotatorContext>,
    Path((lesson_id, segment_id)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<SaveResponse>> {
    let segment_id = parse_segment_id(&segment_id)
        .ok_or_else(|| ApiError::NotFound("Segment id must be an integer".to_string()))?;

    let fields: AnnotationFields = if body.iter().all(u8::is_ascii_whitespace) {
        AnnotationFields::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid annotation body: {}", e)))?
    };

    let annotation = ctx.save_annotation(&lesson_id, segment_id, fields).await?;

    Ok(Json(SaveResponse {
        status: "saved".to_string(),
        segment_key: annotation.key(),
    }))
}

/// Unsigned decimal digits only, so `+5` and `-1` do not alias real segments
fn parse_segment_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// GET /api/annotations
pub async fn get_all_annotations(
    State(ctx): State<AnnotatorContext>,
) -> ApiResult<Json<AnnotationSnapshot>> {
    Ok(Json(ctx.all_annotations().await?))
}

/// GET /api/export
pub async fn export_annotations(
    State(ctx): State<AnnotatorContext>,
) -> ApiResult<([(HeaderName, String); 1], Json<Vec<ExportRecord>>)> {
    let report = ctx.export().await?;
    let skipped = report.skipped.total().to_string();
    Ok(([(EXPORT_SKIPPED_HEADER, skipped)], Json(report.records)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segment_id() {
        assert_eq!(parse_segment_id("0"), Some(0));
        assert_eq!(parse_segment_id("42"), Some(42));
        assert_eq!(parse_segment_id("+5"), None);
        assert_eq!(parse_segment_id("-1"), None);
        assert_eq!(parse_segment_id("1.0"), None);
        assert_eq!(parse_segment_id(""), None);
        assert_eq!(parse_segment_id("99999999999999999999"), None);
    }
}
