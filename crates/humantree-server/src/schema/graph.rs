//! Rendered-graph request/response types.

use serde::{Deserialize, Serialize};

use humantree_view::RenderGraph;

/// `GET /trees/{id}/graph` query parameters.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GraphQuery {
    /// Viewer identity for progress annotation; anonymous when absent.
    #[serde(default)]
    pub user: Option<String>,
    /// Editing mode strips progress checkboxes from node data.
    #[serde(default)]
    pub editing: Option<bool>,
    /// Dark color mode for node style data.
    #[serde(default)]
    pub dark: Option<bool>,
}

/// `GET /trees/{id}/graph` response.
#[derive(Debug, Clone, Serialize)]
pub struct GraphResponse {
    #[serde(flatten)]
    pub graph: RenderGraph,
}
