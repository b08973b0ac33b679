//! Router assembly for the HumanTree HTTP API.
//!
//! [`build_router`] wires all handler functions to their routes with CORS
//! and tracing middleware layers.

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax. CORS is permissive (the SPA
/// may be served from another origin). TraceLayer provides request-level
/// logging via tracing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Tree management
        .route(
            "/trees",
            get(handlers::trees::list_trees).post(handlers::trees::create_tree),
        )
        .route(
            "/trees/{id}",
            get(handlers::trees::get_tree).delete(handlers::trees::delete_tree),
        )
        .route("/trees/{id}/save", put(handlers::trees::save_tree))
        // Rendered graph
        .route("/trees/{id}/graph", get(handlers::graph::render_graph))
        .route(
            "/trees/{id}/valid-connection",
            get(handlers::graph::valid_connection),
        )
        // Edit sessions
        .route(
            "/trees/{id}/session",
            get(handlers::sessions::session_status).post(handlers::sessions::begin_session),
        )
        .route(
            "/trees/{id}/session/mutations",
            post(handlers::sessions::apply_mutations),
        )
        .route(
            "/trees/{id}/session/save",
            post(handlers::sessions::save_session),
        )
        .route(
            "/trees/{id}/session/exit",
            post(handlers::sessions::exit_session),
        )
        // Progress
        .route(
            "/users/{user}/skills-checked",
            get(handlers::progress::skills_checked).post(handlers::progress::check_skill),
        )
        .route(
            "/users/{user}/skills-checked/{skill_id}",
            delete(handlers::progress::uncheck_skill),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
