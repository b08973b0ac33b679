//! Save-payload preparation shared by all backends.
//!
//! A save payload may contain session-local skills (negative IDs). Before
//! anything is written the payload is validated structurally, then every
//! local ID is exchanged for a backend-assigned positive one through a
//! correspondence map, and all `unlock_ids` references are rewritten
//! through the same map.

use std::collections::HashMap;

use humantree_core::{SkillId, SkillTree, TreeId};

use crate::error::StorageError;

/// Validates a save payload. Structural rules: exactly one root when
/// non-empty, and the root never appears as an unlock target.
pub fn validate_for_save(tree: &SkillTree) -> Result<(), StorageError> {
    tree.validate().map_err(|e| StorageError::InvalidTree {
        reason: e.to_string(),
    })
}

/// Rewrites session-local skill IDs using backend-assigned replacements.
///
/// `alloc` is called once per negative-ID skill, in list order, and must
/// return a fresh positive ID (e.g. an inserted row's key). The returned
/// tree carries `id`, remapped skill IDs, and rewritten unlock references;
/// positive IDs pass through untouched.
pub fn remap_local_ids(
    id: TreeId,
    tree: &SkillTree,
    mut alloc: impl FnMut(&humantree_core::Skill) -> Result<i64, StorageError>,
) -> Result<SkillTree, StorageError> {
    let mut correspondence: HashMap<SkillId, SkillId> = HashMap::new();
    for skill in tree.skills.iter().filter(|s| s.id.is_local()) {
        let assigned = SkillId(alloc(skill)?);
        correspondence.insert(skill.id, assigned);
    }

    let mut saved = tree.clone();
    saved.id = id;
    for skill in &mut saved.skills {
        if let Some(&assigned) = correspondence.get(&skill.id) {
            skill.id = assigned;
        }
        for unlock in &mut skill.unlock_ids {
            if let Some(&assigned) = correspondence.get(unlock) {
                *unlock = assigned;
            }
        }
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use humantree_core::Skill;

    fn tree_with_locals() -> SkillTree {
        let mut tree = SkillTree::new(TreeId(1), "t", "alice");
        let mut root = Skill::new(SkillId(1), "Root", None);
        root.is_root = true;
        root.unlock_ids.push(SkillId(-1));
        tree.skills.push(root);

        let mut local = Skill::new(SkillId(-1), "Fresh", None);
        local.unlock_ids.push(SkillId(-2));
        tree.skills.push(local);
        tree.skills.push(Skill::new(SkillId(-2), "Fresher", None));
        tree
    }

    #[test]
    fn locals_are_replaced_and_references_rewritten() {
        let mut next = 100;
        let saved = remap_local_ids(TreeId(1), &tree_with_locals(), |_| {
            next += 1;
            Ok(next)
        })
        .unwrap();

        assert!(saved.skills.iter().all(|s| s.id.is_persisted()));
        assert_eq!(saved.skills[0].unlock_ids.as_slice(), &[SkillId(101)]);
        assert_eq!(saved.skills[1].id, SkillId(101));
        assert_eq!(saved.skills[1].unlock_ids.as_slice(), &[SkillId(102)]);
        assert_eq!(saved.skills[2].id, SkillId(102));
    }

    #[test]
    fn persisted_ids_pass_through() {
        let tree = tree_with_locals();
        let saved = remap_local_ids(TreeId(1), &tree, |_| Ok(999)).unwrap();
        assert_eq!(saved.skills[0].id, SkillId(1));
    }

    #[test]
    fn validate_for_save_surfaces_root_violations() {
        let mut tree = tree_with_locals();
        tree.skills[0].is_root = false;
        let err = validate_for_save(&tree).unwrap_err();
        assert!(matches!(err, StorageError::InvalidTree { .. }));
    }
}
