//! Rendered-graph handlers.

use axum::extract::{Path, Query, State};
use axum::Json;

use humantree_core::{SkillId, TreeId};
use humantree_view::{ColorMode, RenderRequest};

use crate::error::ApiError;
use crate::schema::graph::{GraphQuery, GraphResponse};
use crate::schema::sessions::{ValidConnectionQuery, ValidConnectionResponse};
use crate::state::AppState;

/// Renders the tree's graph: nodes with roles, styles, and layout
/// positions, plus edges.
///
/// `GET /trees/{id}/graph?user=&editing=&dark=`
///
/// The snapshot is taken under the service lock; layout runs on the
/// blocking pool through the tree's versioned pipeline. A render overtaken
/// by an edit is discarded and retried against the fresh state.
pub async fn render_graph(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<GraphQuery>,
) -> Result<Json<GraphResponse>, ApiError> {
    let id = TreeId(id);
    let pipeline = state.pipeline(id);
    let mode = if query.dark.unwrap_or(false) {
        ColorMode::Dark
    } else {
        ColorMode::Light
    };
    let editing = query.editing.unwrap_or(false);

    // Bounded retry: each attempt re-snapshots against the latest version.
    for _ in 0..3 {
        let version = pipeline.current_version();
        let snapshot = {
            let service = state.service.lock().await;
            service.graph_snapshot(id, query.user.as_deref())?
        };
        let mut request = RenderRequest::new(snapshot.tree, mode, editing);
        request.progress = snapshot.progress;
        request.linked_stats = snapshot.linked_stats;

        if let Some(graph) = pipeline.render(version, request).await {
            return Ok(Json(GraphResponse { graph }));
        }
    }
    Err(ApiError::Conflict(
        "tree changed repeatedly during render; retry".into(),
    ))
}

/// Pre-flight check for a drag-to-connect gesture.
///
/// `GET /trees/{id}/valid-connection?source=&target=`
pub async fn valid_connection(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ValidConnectionQuery>,
) -> Result<Json<ValidConnectionResponse>, ApiError> {
    let service = state.service.lock().await;
    let valid = service.is_valid_connection(
        TreeId(id),
        SkillId(query.source),
        SkillId(query.target),
    )?;
    Ok(Json(ValidConnectionResponse { valid }))
}
