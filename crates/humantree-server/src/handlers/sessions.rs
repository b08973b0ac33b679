//! Edit-session handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use humantree_core::TreeId;

use crate::error::ApiError;
use crate::handlers::actor;
use crate::schema::sessions::{ExitRequest, MutationRequest, MutationResponse, SessionView};
use crate::state::AppState;

/// Starts (or resumes into) an edit session for the tree. Creator only.
///
/// `POST /trees/{id}/session`
pub async fn begin_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SessionView>, ApiError> {
    let actor = actor(&headers)?;
    let mut service = state.service.lock().await;
    let view = service.begin_session(TreeId(id), &actor)?;
    Ok(Json(view))
}

/// Reports the session's mode and dirtiness.
///
/// `GET /trees/{id}/session`
pub async fn session_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SessionView>, ApiError> {
    let service = state.service.lock().await;
    let view = service.session_status(TreeId(id))?;
    Ok(Json(view))
}

/// Applies a batch of structural/content edits to the working copy.
///
/// `POST /trees/{id}/session/mutations`
///
/// The handler is deliberately thin -- batch/dry-run/validation logic
/// lives in [`crate::service::TreeService::apply_mutations`].
pub async fn apply_mutations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<MutationRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let actor = actor(&headers)?;
    let id = TreeId(id);
    let response = {
        let mut service = state.service.lock().await;
        service.apply_mutations(id, &actor, &req.mutations, req.dry_run)?
    };
    if response.committed {
        state.invalidate_tree(id);
    }
    Ok(Json(response))
}

/// Persists the session's working copy.
///
/// `POST /trees/{id}/session/save`
pub async fn save_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SessionView>, ApiError> {
    let actor = actor(&headers)?;
    let id = TreeId(id);
    let view = {
        let mut service = state.service.lock().await;
        service.save_session(id, &actor)?
    };
    // Saved trees may carry remapped skill IDs.
    state.invalidate_tree(id);
    Ok(Json(view))
}

/// Leaves editing mode. Dirty sessions require `discard: true`.
///
/// `POST /trees/{id}/session/exit`
pub async fn exit_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ExitRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let id = TreeId(id);
    let view = {
        let mut service = state.service.lock().await;
        service.exit_session(id, req.discard)?
    };
    if req.discard {
        state.invalidate_tree(id);
    }
    Ok(Json(view))
}
