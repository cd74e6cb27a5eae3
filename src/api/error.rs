//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::core::{AnnotatorError, StoreError, ViewError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Malformed request body (400)
    #[error("{0}")]
    BadRequest(String),

    /// Annotation storage failed (500)
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AnnotatorError> for ApiError {
    fn from(err: AnnotatorError) -> Self {
        match err {
            AnnotatorError::View(ViewError::LessonNotFound(_)) => {
                ApiError::NotFound("Lesson not found".to_string())
            }
            AnnotatorError::Store(e) => ApiError::Store(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(e) => {
                error!("Annotation storage failure: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
