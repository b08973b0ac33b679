//! Core error types for humantree-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Structural
//! edit rejections are errors to the caller, but the contract is "the
//! mutation did not happen and the prior state is preserved exactly" --
//! callers surface the reason, the tree is never left half-edited.

use crate::id::SkillId;
use thiserror::Error;

/// Errors produced by the skill tree data model and edit engine.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A skill ID was not found in the tree.
    #[error("skill not found: SkillId({id})", id = id.0)]
    SkillNotFound { id: SkillId },

    /// The unlock edge already exists.
    #[error("duplicate unlock edge: {from} -> {target}")]
    DuplicateEdge { from: SkillId, target: SkillId },

    /// A skill may not unlock itself.
    #[error("self loop rejected on skill {id}")]
    SelfLoop { id: SkillId },

    /// Adding the edge would create a cycle.
    #[error("edge {from} -> {target} would create a cycle")]
    WouldCycle { from: SkillId, target: SkillId },

    /// The root skill cannot be deleted while other skills remain.
    #[error("cannot delete the root skill {id}; rewire the tree first")]
    RootDeletion { id: SkillId },

    /// The single-root invariant does not hold.
    #[error("root invariant violated: {reason}")]
    RootInvariant { reason: String },

    /// Too many tags on a tree.
    #[error("too many tags: {count} (maximum {max})")]
    TooManyTags { count: usize, max: usize },

    /// A single tag exceeds the length limit.
    #[error("tag too long: '{tag}' (maximum {max} characters)")]
    TagTooLong { tag: String, max: usize },
}
