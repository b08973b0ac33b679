//! The skill tree data model.
//!
//! A [`SkillTree`] is a flat list of [`Skill`]s whose `unlock_ids` pointers
//! form a directed acyclic graph. Exactly one skill carries `is_root = true`
//! whenever the tree is non-empty; operationally the root is the skill that
//! is never the target of any unlock edge. The edit engine (see
//! [`crate::edit`]) is the sole write path for structural changes and keeps
//! both invariants intact.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::{SkillId, TreeId};

/// Inline capacity for unlock lists; most skills unlock only a few children.
pub type UnlockList = SmallVec<[SkillId; 4]>;

/// A single node in a skill tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    /// Rich text, opaque to the engine.
    pub description: Option<String>,
    pub is_root: bool,
    /// Outgoing unlock edges, in insertion order. Order affects rendering
    /// only, never semantics.
    #[serde(default)]
    pub unlock_ids: UnlockList,
    /// When set, this skill is a portal to another tree rather than a
    /// content node; its own unlock graph is not expanded here.
    #[serde(default)]
    pub linked_tree_id: Option<TreeId>,
}

impl Skill {
    /// A plain content skill with no edges.
    pub fn new(id: SkillId, name: impl Into<String>, description: Option<String>) -> Self {
        Skill {
            id,
            name: name.into(),
            description,
            is_root: false,
            unlock_ids: UnlockList::new(),
            linked_tree_id: None,
        }
    }

    /// True when this skill unlocks `target`.
    pub fn unlocks(&self, target: SkillId) -> bool {
        self.unlock_ids.contains(&target)
    }
}

/// The aggregate root: a named tree of skills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTree {
    pub id: TreeId,
    pub name: String,
    pub description: Option<String>,
    /// External identity of the tree's creator; authorization checks
    /// compare against it but the engine never interprets it.
    pub creator: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub skills: Vec<Skill>,
}

impl SkillTree {
    /// An empty tree.
    pub fn new(id: TreeId, name: impl Into<String>, creator: impl Into<String>) -> Self {
        SkillTree {
            id,
            name: name.into(),
            description: None,
            creator: creator.into(),
            tags: Vec::new(),
            skills: Vec::new(),
        }
    }

    /// Looks up a skill by ID.
    pub fn skill(&self, id: SkillId) -> Option<&Skill> {
        self.skills.iter().find(|s| s.id == id)
    }

    /// Looks up a skill by ID (mutable).
    pub fn skill_mut(&mut self, id: SkillId) -> Option<&mut Skill> {
        self.skills.iter_mut().find(|s| s.id == id)
    }

    /// The current root skill, if any.
    pub fn root(&self) -> Option<&Skill> {
        self.skills.iter().find(|s| s.is_root)
    }

    /// First skill (in list order) that unlocks `id`, i.e. its parent.
    /// Skills reachable from several parents return the earliest one.
    pub fn parent_of(&self, id: SkillId) -> Option<&Skill> {
        self.skills.iter().find(|s| s.unlocks(id))
    }

    /// All unlock edges as `(source, target)` pairs, in skill order then
    /// unlock order. This ordering is deterministic and drives rendering.
    pub fn unlock_edges(&self) -> impl Iterator<Item = (SkillId, SkillId)> + '_ {
        self.skills
            .iter()
            .flat_map(|s| s.unlock_ids.iter().map(move |&t| (s.id, t)))
    }

    /// Next available session-local ID.
    ///
    /// Returns `-1` when the tree is empty or every skill has a positive
    /// (persisted) ID, otherwise one below the current minimum. The result
    /// is a probe, not a generator: insert the new skill before probing
    /// again.
    pub fn next_local_id(&self) -> SkillId {
        let min = self.skills.iter().map(|s| s.id.0).min();
        match min {
            Some(m) if m < 0 => SkillId(m - 1),
            _ => SkillId(-1),
        }
    }
}

/// The set of skills a user has marked complete.
///
/// Owned by the progress collaborator; the engine only reads it to annotate
/// graph nodes. A `BTreeSet` keeps serialization order stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub skill_ids: BTreeSet<SkillId>,
}

impl UserProgress {
    pub fn contains(&self, id: SkillId) -> bool {
        self.skill_ids.contains(&id)
    }
}
