//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the unified error type for all API endpoints. It
//! implements `axum::response::IntoResponse` to produce structured JSON
//! error responses with appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use humantree_core::TreeError;
use humantree_session::SessionError;
use humantree_storage::StorageError;

/// Structured error detail in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details (e.g., the rejected edge's endpoints).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API errors with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Entity not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Actor is not allowed to perform the operation (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource conflict, e.g. unsaved changes or a save in flight (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        let detail = ApiErrorDetail {
            code: code.to_string(),
            message: self.to_string(),
            details: None,
        };
        let body = serde_json::json!({
            "success": false,
            "error": detail,
        });
        (status, axum::Json(body)).into_response()
    }
}

impl From<TreeError> for ApiError {
    fn from(err: TreeError) -> Self {
        match &err {
            TreeError::SkillNotFound { .. } => ApiError::NotFound(err.to_string()),
            TreeError::DuplicateEdge { .. }
            | TreeError::SelfLoop { .. }
            | TreeError::WouldCycle { .. }
            | TreeError::RootDeletion { .. }
            | TreeError::RootInvariant { .. }
            | TreeError::TooManyTags { .. }
            | TreeError::TagTooLong { .. } => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::TreeNotFound(_) | StorageError::SkillNotFound { .. } => {
                ApiError::NotFound(err.to_string())
            }
            StorageError::InvalidTree { .. } => ApiError::BadRequest(err.to_string()),
            StorageError::IntegrityError { .. } => ApiError::Conflict(err.to_string()),
            StorageError::Serialization(_)
            | StorageError::Sqlite(_)
            | StorageError::Migration(_) => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotAuthorized => ApiError::Forbidden(err.to_string()),
            SessionError::AlreadyEditing
            | SessionError::NotEditing
            | SessionError::SaveInFlight
            | SessionError::NoSaveInFlight => ApiError::Conflict(err.to_string()),
            SessionError::Edit(inner) => inner.into(),
            SessionError::Save(inner) => inner.into(),
        }
    }
}
