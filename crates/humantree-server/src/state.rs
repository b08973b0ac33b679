//! Application state shared across axum handlers.
//!
//! [`AppState`] wraps the service in `Arc<tokio::sync::Mutex<>>` for use
//! with axum handlers. The async-aware mutex lets handlers await the lock
//! without blocking the tokio runtime; `tokio::sync::RwLock` is not an
//! option because the service holds a `rusqlite::Connection`, which is
//! `!Sync`.
//!
//! Render pipelines live outside the service lock in a `DashMap`, one per
//! tree: handlers snapshot inputs under the lock, release it, and run the
//! CPU-bound layout on the blocking pool. Mutating endpoints bump the
//! tree's pipeline version so superseded renders are discarded.

use std::sync::Arc;

use dashmap::DashMap;

use humantree_core::TreeId;
use humantree_view::RenderPipeline;

use crate::error::ApiError;
use crate::service::TreeService;

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// The shared tree service (async Mutex -- non-blocking await).
    pub service: Arc<tokio::sync::Mutex<TreeService>>,
    /// Per-tree render pipelines with generation counters.
    pub pipelines: Arc<DashMap<TreeId, Arc<RenderPipeline>>>,
}

impl AppState {
    /// Creates state backed by a SQLite database at `db_path`.
    pub fn new(db_path: &str) -> Result<Self, ApiError> {
        let service = TreeService::new(db_path)?;
        Ok(AppState {
            service: Arc::new(tokio::sync::Mutex::new(service)),
            pipelines: Arc::new(DashMap::new()),
        })
    }

    /// Creates state with an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, ApiError> {
        let service = TreeService::in_memory()?;
        Ok(AppState {
            service: Arc::new(tokio::sync::Mutex::new(service)),
            pipelines: Arc::new(DashMap::new()),
        })
    }

    /// The render pipeline for a tree, created on first use.
    pub fn pipeline(&self, id: TreeId) -> Arc<RenderPipeline> {
        self.pipelines
            .entry(id)
            .or_insert_with(|| Arc::new(RenderPipeline::new()))
            .clone()
    }

    /// Marks any in-flight render of this tree stale.
    pub fn invalidate_tree(&self, id: TreeId) {
        if let Some(pipeline) = self.pipelines.get(&id) {
            pipeline.invalidate();
        }
    }
}
