//! Progress handlers (completed-skill marks).

use axum::extract::{Path, State};
use axum::Json;

use humantree_core::SkillId;

use crate::error::ApiError;
use crate::schema::progress::{CheckSkillRequest, ProgressResponse};
use crate::state::AppState;

/// All skills a user has checked, across every tree.
///
/// `GET /users/{user}/skills-checked`
pub async fn skills_checked(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let service = state.service.lock().await;
    let progress = service.skills_checked(&user)?;
    Ok(Json(ProgressResponse { progress }))
}

/// Marks a skill complete for the user. Idempotent.
///
/// `POST /users/{user}/skills-checked`
pub async fn check_skill(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(req): Json<CheckSkillRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut service = state.service.lock().await;
    service.set_skill_checked(&user, req.skill_id, true)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Clears a skill's completion mark for the user. Idempotent.
///
/// `DELETE /users/{user}/skills-checked/{skill_id}`
pub async fn uncheck_skill(
    State(state): State<AppState>,
    Path((user, skill_id)): Path<(String, i64)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut service = state.service.lock().await;
    service.set_skill_checked(&user, SkillId(skill_id), false)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
