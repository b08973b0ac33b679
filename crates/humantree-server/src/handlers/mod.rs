//! HTTP handlers. Deliberately thin: extraction and status mapping here,
//! business logic in [`crate::service::TreeService`].

pub mod graph;
pub mod progress;
pub mod sessions;
pub mod trees;

use axum::http::HeaderMap;

use crate::error::ApiError;

/// The acting user's identity, carried in the `x-user` header.
///
/// Authentication itself is an external concern; the header is trusted
/// here the way a session token would be after middleware validation.
pub(crate) fn actor(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("x-user")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Forbidden("missing x-user header".into()))
}
