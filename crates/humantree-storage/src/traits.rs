//! The [`TreeStore`] and [`ProgressStore`] traits defining the persistence
//! contracts.
//!
//! These are the collaborator seams of the engine: the edit session and the
//! HTTP service talk to storage only through them, so backends
//! (`MemStore`, `SqliteStore`) are fully swappable. The traits are
//! synchronous; async callers hold them behind an async-aware lock.

use humantree_core::{SkillId, SkillTree, TreeId, UserProgress};

use crate::error::StorageError;
use crate::types::TreeSummary;

/// Persistence contract for skill trees.
pub trait TreeStore {
    /// Creates a new empty tree and returns its assigned ID.
    fn create_tree(
        &mut self,
        name: &str,
        description: Option<&str>,
        creator: &str,
        tags: &[String],
    ) -> Result<TreeId, StorageError>;

    /// Loads a complete tree, skills included.
    fn load_tree(&self, id: TreeId) -> Result<SkillTree, StorageError>;

    /// Saves a full tree state over the stored one.
    ///
    /// Validates the single-root structure, remaps session-local (negative)
    /// skill IDs to freshly assigned positive ones, rewrites unlock
    /// references through the remap, and deletes stored skills missing from
    /// the payload (their progress rows go with them). Returns the tree as
    /// persisted, remapped IDs included, so callers can reconcile their
    /// working copy.
    fn save_tree(&mut self, id: TreeId, tree: &SkillTree) -> Result<SkillTree, StorageError>;

    /// Deletes a tree and all its skills.
    fn delete_tree(&mut self, id: TreeId) -> Result<(), StorageError>;

    /// Lists all stored trees.
    fn list_trees(&self) -> Result<Vec<TreeSummary>, StorageError>;
}

/// Persistence contract for per-user completion marks.
pub trait ProgressStore {
    /// All skills the user has checked, across every tree.
    fn skills_checked(&self, user: &str) -> Result<UserProgress, StorageError>;

    /// Marks or unmarks one skill. Idempotent: re-checking a checked skill
    /// (or unchecking an unchecked one) is a no-op. The skill must exist.
    fn set_skill_checked(
        &mut self,
        user: &str,
        skill: SkillId,
        checked: bool,
    ) -> Result<(), StorageError>;
}
