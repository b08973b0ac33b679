//! Structural edit operations over a [`SkillTree`].
//!
//! This module is the sole write path for the unlock graph. Every operation
//! either fully applies or returns an error with the tree untouched; no
//! half-applied state is ever observable. The operations maintain two
//! invariants:
//!
//! - the unlock relation stays acyclic (no skill unlocks itself, directly
//!   or transitively);
//! - exactly one skill has `is_root = true` while the tree is non-empty.
//!
//! Root re-assignment on [`add_unlock_edge`](SkillTree::add_unlock_edge)
//! follows the "promote the outside entry point" policy: when a new edge
//! targets the current root, the walk climbs from the edge's source through
//! parents until a parentless skill is found, and that skill becomes the
//! new root.

use std::collections::HashSet;

use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;

use crate::error::TreeError;
use crate::id::{SkillId, TreeId};
use crate::skill::{Skill, SkillTree};

impl SkillTree {
    /// Adds an unlock edge `source -> target`.
    ///
    /// Rejected when either endpoint is missing, the edge already exists,
    /// it would be a self-loop, or a path `target -> ... -> source` already
    /// exists (the edge would close a cycle). On success the target is
    /// appended to the source's unlock list, and if the target was the root
    /// the root moves to the top of the source's parent chain.
    pub fn add_unlock_edge(&mut self, source: SkillId, target: SkillId) -> Result<(), TreeError> {
        let source_index = self
            .skills
            .iter()
            .position(|s| s.id == source)
            .ok_or(TreeError::SkillNotFound { id: source })?;
        if self.skills[source_index].unlocks(target) {
            return Err(TreeError::DuplicateEdge { from: source, target });
        }
        let target_was_root = match self.skill(target) {
            Some(t) => t.is_root,
            None => return Err(TreeError::SkillNotFound { id: target }),
        };
        if source == target {
            return Err(TreeError::SelfLoop { id: source });
        }
        if self.path_exists(target, source) {
            return Err(TreeError::WouldCycle { from: source, target });
        }

        self.skills[source_index].unlock_ids.push(target);

        if target_was_root {
            let new_root = self.climb_to_root(source);
            self.set_root(new_root);
        }

        #[cfg(debug_assertions)]
        self.assert_single_root();

        Ok(())
    }

    /// Removes the unlock edge `source -> target`.
    ///
    /// A missing edge (or missing source) is a no-op. Removing an edge
    /// never changes which skill is the root.
    pub fn remove_unlock_edge(&mut self, source: SkillId, target: SkillId) {
        if let Some(skill) = self.skill_mut(source) {
            skill.unlock_ids.retain(|id| *id != target);
        }
    }

    /// Moves an unlock edge: removes the old edge, then adds the new one.
    ///
    /// The add step validates as usual and may reject; in that case the old
    /// edge stays removed (net effect: deletion, not replacement).
    pub fn reconnect_unlock_edge(
        &mut self,
        old_source: SkillId,
        old_target: SkillId,
        new_source: SkillId,
        new_target: SkillId,
    ) -> Result<(), TreeError> {
        self.remove_unlock_edge(old_source, old_target);
        self.add_unlock_edge(new_source, new_target)
    }

    /// Deletes a skill and strips it from every unlock list.
    ///
    /// The root skill cannot be deleted while the tree holds it; the caller
    /// is expected to surface this to the user. Deleting an unknown ID is a
    /// no-op.
    pub fn delete_skill(&mut self, id: SkillId) -> Result<(), TreeError> {
        if self.skill(id).is_some_and(|s| s.is_root) {
            return Err(TreeError::RootDeletion { id });
        }
        self.skills.retain(|s| s.id != id);
        for skill in &mut self.skills {
            skill.unlock_ids.retain(|u| *u != id);
        }

        #[cfg(debug_assertions)]
        self.assert_single_root();

        Ok(())
    }

    /// Creates a content skill with a fresh session-local ID.
    ///
    /// The new skill becomes the root only when the tree was empty.
    pub fn create_skill(&mut self, name: impl Into<String>, description: Option<String>) -> SkillId {
        let id = self.next_local_id();
        let mut skill = Skill::new(id, name, description);
        skill.is_root = self.skills.is_empty();
        self.skills.push(skill);

        #[cfg(debug_assertions)]
        self.assert_single_root();

        id
    }

    /// Creates a portal skill referencing another tree.
    pub fn create_linked_skill(&mut self, name: impl Into<String>, linked: TreeId) -> SkillId {
        let id = self.next_local_id();
        let mut skill = Skill::new(id, name, None);
        skill.is_root = self.skills.is_empty();
        skill.linked_tree_id = Some(linked);
        self.skills.push(skill);

        #[cfg(debug_assertions)]
        self.assert_single_root();

        id
    }

    /// Read-only gesture gate: would `source -> target` be a legal edge?
    ///
    /// Combines the self-loop and cycle checks of
    /// [`add_unlock_edge`](Self::add_unlock_edge) so the presentation layer
    /// can disable an invalid drag before the user commits it. A missing
    /// target is never a valid connection.
    pub fn is_valid_connection(&self, source: SkillId, target: SkillId) -> bool {
        if self.skill(target).is_none() {
            return false;
        }
        if source == target {
            return false;
        }
        !self.path_exists(target, source)
    }

    /// Save-time structural validation: exactly one root when non-empty,
    /// and the root is never the target of an unlock edge.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.skills.is_empty() {
            return Ok(());
        }
        let roots: Vec<SkillId> = self
            .skills
            .iter()
            .filter(|s| s.is_root)
            .map(|s| s.id)
            .collect();
        match roots.as_slice() {
            [] => {
                return Err(TreeError::RootInvariant {
                    reason: "no root skill in a non-empty tree".into(),
                })
            }
            [root] => {
                if self.unlock_edges().any(|(_, t)| t == *root) {
                    return Err(TreeError::RootInvariant {
                        reason: format!("root skill {root} is the target of an unlock edge"),
                    });
                }
            }
            many => {
                return Err(TreeError::RootInvariant {
                    reason: format!("{} skills are flagged as root", many.len()),
                })
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Builds the unlock relation as a petgraph map for reachability
    /// queries. All skills are added as nodes so isolated ones are present.
    fn unlock_graph(&self) -> DiGraphMap<i64, ()> {
        let mut graph = DiGraphMap::new();
        for skill in &self.skills {
            graph.add_node(skill.id.0);
        }
        for (source, target) in self.unlock_edges() {
            graph.add_edge(source.0, target.0, ());
        }
        graph
    }

    /// True when a path `from -> ... -> to` exists over current edges.
    /// Terminates on any finite graph, cyclic or not.
    fn path_exists(&self, from: SkillId, to: SkillId) -> bool {
        let graph = self.unlock_graph();
        has_path_connecting(&graph, from.0, to.0, None)
    }

    /// Walks upward from `start` through parents (first parent in list
    /// order at each step) until a parentless skill is found. The visited
    /// set makes the walk terminate even if the acyclicity invariant were
    /// ever violated.
    fn climb_to_root(&self, start: SkillId) -> SkillId {
        let mut current = start;
        let mut visited = HashSet::new();
        visited.insert(current);
        while let Some(parent) = self.parent_of(current) {
            if !visited.insert(parent.id) {
                break;
            }
            current = parent.id;
        }
        current
    }

    /// Sets `new_root` as the single root, clearing every other flag.
    fn set_root(&mut self, new_root: SkillId) {
        for skill in &mut self.skills {
            skill.is_root = skill.id == new_root;
        }
    }

    /// Debug-only check that the single-root invariant holds.
    #[cfg(debug_assertions)]
    fn assert_single_root(&self) {
        if self.skills.is_empty() {
            return;
        }
        let roots = self.skills.iter().filter(|s| s.is_root).count();
        assert_eq!(roots, 1, "expected exactly one root skill, found {roots}");
    }
}

/// True when the unlock relation contains no cycle.
pub fn is_acyclic(tree: &SkillTree) -> bool {
    let mut graph = DiGraphMap::<i64, ()>::new();
    for skill in &tree.skills {
        graph.add_node(skill.id.0);
    }
    for (source, target) in tree.unlock_edges() {
        graph.add_edge(source.0, target.0, ());
    }
    !petgraph::algo::is_cyclic_directed(&graph)
}
