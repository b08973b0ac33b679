//! Edit-session request/response types.
//!
//! Structural edits arrive as batches of [`Mutation`] values applied
//! atomically: either every mutation in the batch passes validation and the
//! working copy advances, or nothing changes and the response carries the
//! rejection. `dry_run` previews validation without committing.

use serde::{Deserialize, Serialize};

use humantree_core::{SkillId, TreeId};
use humantree_session::SessionMode;

/// A single structural or content edit against the working copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Mutation {
    /// Add an unlock edge between two skills.
    AddEdge { source: SkillId, target: SkillId },
    /// Remove an unlock edge. Removing a missing edge is a no-op.
    RemoveEdge { source: SkillId, target: SkillId },
    /// Move an unlock edge to new endpoints. The add half validates as
    /// usual; if it rejects, the old edge stays removed.
    ReconnectEdge {
        old_source: SkillId,
        old_target: SkillId,
        new_source: SkillId,
        new_target: SkillId,
    },
    /// Create a content skill with a fresh session-local ID.
    CreateSkill {
        name: String,
        #[serde(default)]
        description: Option<String>,
    },
    /// Create a portal skill referencing another tree.
    CreateLinkedSkill { name: String, linked_tree_id: TreeId },
    /// Delete a skill (rejected for the root).
    DeleteSkill { id: SkillId },
    /// Update a skill's name and/or description.
    UpdateSkill {
        id: SkillId,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
    /// Update the tree's name and/or description.
    UpdateTree {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
    /// Replace the tree's tags (normalized before applying).
    SetTags { tags: Vec<String> },
}

/// `POST /trees/{id}/session/mutations` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct MutationRequest {
    pub mutations: Vec<Mutation>,
    /// Validate only; the working copy is untouched.
    #[serde(default)]
    pub dry_run: bool,
}

/// Mutation batch outcome. HTTP 200 either way; `valid` carries the
/// verdict so rejected edits stay cheap for interactive callers.
#[derive(Debug, Clone, Serialize)]
pub struct MutationResponse {
    /// Whether the whole batch passed validation.
    pub valid: bool,
    /// Session-local IDs of skills created by the batch, in order.
    pub created: Vec<SkillId>,
    /// Rejection message when `valid` is `false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the working copy advanced (`false` for dry runs and
    /// rejections).
    pub committed: bool,
}

/// Session status, returned by every session endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub tree_id: TreeId,
    pub mode: SessionMode,
    pub dirty: bool,
    pub saving: bool,
}

/// `POST /trees/{id}/session/exit` request body.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExitRequest {
    /// Confirmed discard of unsaved changes. Without it, a dirty session
    /// refuses to exit.
    #[serde(default)]
    pub discard: bool,
}

/// `GET /trees/{id}/valid-connection` query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidConnectionQuery {
    pub source: i64,
    pub target: i64,
}

/// `GET /trees/{id}/valid-connection` response.
#[derive(Debug, Clone, Serialize)]
pub struct ValidConnectionResponse {
    pub valid: bool,
}
