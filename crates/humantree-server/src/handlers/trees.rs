//! Tree management handlers (list, create, get, save, delete).

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use humantree_core::{SkillTree, TreeId};

use crate::error::ApiError;
use crate::handlers::actor;
use crate::schema::trees::{
    CreateTreeRequest, CreateTreeResponse, SaveTreeRequest, SaveTreeResponse, TreeListResponse,
};
use crate::state::AppState;

/// Lists all trees.
///
/// `GET /trees`
pub async fn list_trees(
    State(state): State<AppState>,
) -> Result<Json<TreeListResponse>, ApiError> {
    let service = state.service.lock().await;
    let trees = service.list_trees()?;
    Ok(Json(TreeListResponse { trees }))
}

/// Creates a new tree owned by the acting user.
///
/// `POST /trees`
pub async fn create_tree(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateTreeRequest>,
) -> Result<Json<CreateTreeResponse>, ApiError> {
    let actor = actor(&headers)?;
    let mut service = state.service.lock().await;
    let summary = service.create_tree(&req.name, req.description.as_deref(), &actor, &req.tags)?;
    Ok(Json(CreateTreeResponse { summary }))
}

/// Fetches a tree with its skills.
///
/// `GET /trees/{id}`
pub async fn get_tree(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SkillTree>, ApiError> {
    let service = state.service.lock().await;
    let tree = service.get_tree(TreeId(id))?;
    Ok(Json(tree))
}

/// Persists a full tree state (the non-session save path).
///
/// `PUT /trees/{id}/save`
pub async fn save_tree(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<SaveTreeRequest>,
) -> Result<Json<SaveTreeResponse>, ApiError> {
    let actor = actor(&headers)?;
    let id = TreeId(id);
    let saved = {
        let mut service = state.service.lock().await;
        service.save_tree(id, &req.tree, &actor)?
    };
    state.invalidate_tree(id);
    Ok(Json(SaveTreeResponse { tree: saved }))
}

/// Deletes a tree.
///
/// `DELETE /trees/{id}`
pub async fn delete_tree(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = actor(&headers)?;
    let id = TreeId(id);
    {
        let mut service = state.service.lock().await;
        service.delete_tree(id, &actor)?;
    }
    state.invalidate_tree(id);
    Ok(Json(serde_json::json!({ "success": true })))
}
