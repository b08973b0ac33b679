//! Shared storage-facing types.

use serde::{Deserialize, Serialize};

use humantree_core::TreeId;

/// Listing row for a stored tree; the skill list is loaded separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSummary {
    pub id: TreeId,
    pub name: String,
    pub description: Option<String>,
    pub creator: String,
    pub tags: Vec<String>,
}
