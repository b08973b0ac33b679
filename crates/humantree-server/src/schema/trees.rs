//! Tree management request/response types.

use serde::{Deserialize, Serialize};

use humantree_core::SkillTree;
use humantree_storage::TreeSummary;

/// `POST /trees` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTreeRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// `POST /trees` response: the created tree's summary.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTreeResponse {
    #[serde(flatten)]
    pub summary: TreeSummary,
}

/// `GET /trees` response.
#[derive(Debug, Clone, Serialize)]
pub struct TreeListResponse {
    pub trees: Vec<TreeSummary>,
}

/// `PUT /trees/{id}/save` request body: the full tree state to persist.
/// Session-local (negative) skill IDs are remapped by the save.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveTreeRequest {
    #[serde(flatten)]
    pub tree: SkillTree,
}

/// `PUT /trees/{id}/save` response: the tree as persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SaveTreeResponse {
    #[serde(flatten)]
    pub tree: SkillTree,
}
