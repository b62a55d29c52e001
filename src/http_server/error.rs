//! Maps domain errors onto HTTP responses.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::types::errors::BookmarkError;

/// Error body returned by every failing API call.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Handler error wrapper.
#[derive(Debug)]
pub struct ApiError(pub BookmarkError);

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError(BookmarkError::Validation(msg.into()))
    }
}

impl From<BookmarkError> for ApiError {
    fn from(err: BookmarkError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, detail) = match self.0 {
            BookmarkError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", Some(msg)),
            BookmarkError::NotFound(what) => (StatusCode::NOT_FOUND, "not_found", Some(what)),
            BookmarkError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg)),
            BookmarkError::Storage(msg) => {
                tracing::error!(error = %msg, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };
        (status, Json(ErrorResponse { error, detail })).into_response()
    }
}
