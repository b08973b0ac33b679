//! In-memory implementation of the storage traits.
//!
//! [`MemStore`] is a first-class backend for tests, ephemeral sessions, and
//! anywhere persistence isn't needed. It keeps everything in HashMaps with
//! semantics identical to the SQLite backend.

use std::collections::{BTreeSet, HashMap};

use humantree_core::{SkillId, SkillTree, TreeId, UserProgress};

use crate::convert::{remap_local_ids, validate_for_save};
use crate::error::StorageError;
use crate::traits::{ProgressStore, TreeStore};
use crate::types::TreeSummary;

/// In-memory tree and progress storage.
#[derive(Debug, Default)]
pub struct MemStore {
    trees: HashMap<TreeId, SkillTree>,
    /// Checked skill IDs per user, across all trees.
    progress: HashMap<String, BTreeSet<SkillId>>,
    next_tree_id: i64,
    next_skill_id: i64,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }

    /// True when any stored tree contains the skill.
    fn skill_exists(&self, skill: SkillId) -> bool {
        self.trees.values().any(|t| t.skill(skill).is_some())
    }

    /// Drops progress rows for skills that no longer exist anywhere.
    fn prune_progress(&mut self, removed: &[SkillId]) {
        if removed.is_empty() {
            return;
        }
        for checked in self.progress.values_mut() {
            for id in removed {
                checked.remove(id);
            }
        }
    }
}

impl TreeStore for MemStore {
    fn create_tree(
        &mut self,
        name: &str,
        description: Option<&str>,
        creator: &str,
        tags: &[String],
    ) -> Result<TreeId, StorageError> {
        self.next_tree_id += 1;
        let id = TreeId(self.next_tree_id);
        let mut tree = SkillTree::new(id, name, creator);
        tree.description = description.map(str::to_string);
        tree.tags = tags.to_vec();
        self.trees.insert(id, tree);
        Ok(id)
    }

    fn load_tree(&self, id: TreeId) -> Result<SkillTree, StorageError> {
        self.trees
            .get(&id)
            .cloned()
            .ok_or(StorageError::TreeNotFound(id.0))
    }

    fn save_tree(&mut self, id: TreeId, tree: &SkillTree) -> Result<SkillTree, StorageError> {
        let previous = self
            .trees
            .get(&id)
            .cloned()
            .ok_or(StorageError::TreeNotFound(id.0))?;
        validate_for_save(tree)?;

        // Every persisted skill in the payload must already be stored.
        for skill in tree.skills.iter().filter(|s| s.id.is_persisted()) {
            if previous.skill(skill.id).is_none() {
                return Err(StorageError::SkillNotFound {
                    tree: id.0,
                    skill: skill.id.0,
                });
            }
        }

        let mut next = self.next_skill_id;
        let saved = remap_local_ids(id, tree, |_| {
            next += 1;
            Ok(next)
        })?;
        self.next_skill_id = next;

        // Skills dropped from the payload disappear, progress rows included.
        let removed: Vec<SkillId> = previous
            .skills
            .iter()
            .map(|s| s.id)
            .filter(|old| saved.skill(*old).is_none())
            .collect();
        self.prune_progress(&removed);

        self.trees.insert(id, saved.clone());
        Ok(saved)
    }

    fn delete_tree(&mut self, id: TreeId) -> Result<(), StorageError> {
        let tree = self
            .trees
            .remove(&id)
            .ok_or(StorageError::TreeNotFound(id.0))?;
        let removed: Vec<SkillId> = tree.skills.iter().map(|s| s.id).collect();
        self.prune_progress(&removed);
        Ok(())
    }

    fn list_trees(&self) -> Result<Vec<TreeSummary>, StorageError> {
        let mut summaries: Vec<TreeSummary> = self
            .trees
            .values()
            .map(|t| TreeSummary {
                id: t.id,
                name: t.name.clone(),
                description: t.description.clone(),
                creator: t.creator.clone(),
                tags: t.tags.clone(),
            })
            .collect();
        summaries.sort_by_key(|s| s.id);
        Ok(summaries)
    }
}

impl ProgressStore for MemStore {
    fn skills_checked(&self, user: &str) -> Result<UserProgress, StorageError> {
        Ok(UserProgress {
            skill_ids: self.progress.get(user).cloned().unwrap_or_default(),
        })
    }

    fn set_skill_checked(
        &mut self,
        user: &str,
        skill: SkillId,
        checked: bool,
    ) -> Result<(), StorageError> {
        if !self.skill_exists(skill) {
            return Err(StorageError::SkillNotFound {
                tree: 0,
                skill: skill.0,
            });
        }
        let entry = self.progress.entry(user.to_string()).or_default();
        if checked {
            entry.insert(skill);
        } else {
            entry.remove(&skill);
        }
        Ok(())
    }
}
