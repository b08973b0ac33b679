//! Content hashing for dirty detection.
//!
//! Edit sessions compare the working copy against the last-saved baseline
//! by value. Hashing the canonical JSON encoding with blake3 makes that
//! comparison cheap and independent of where the copies live.

use humantree_core::SkillTree;

/// Content hash of a tree's canonical JSON encoding.
pub fn hash_tree(tree: &SkillTree) -> blake3::Hash {
    // Plain data with string keys: serialization cannot fail.
    let bytes = serde_json::to_vec(tree).expect("SkillTree serializes infallibly");
    blake3::hash(&bytes)
}

/// True when both trees have identical content.
pub fn same_content(a: &SkillTree, b: &SkillTree) -> bool {
    hash_tree(a) == hash_tree(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use humantree_core::TreeId;

    #[test]
    fn identical_trees_hash_equal() {
        let a = SkillTree::new(TreeId(1), "t", "alice");
        let b = a.clone();
        assert!(same_content(&a, &b));
    }

    #[test]
    fn any_field_change_flips_the_hash() {
        let a = SkillTree::new(TreeId(1), "t", "alice");

        let mut renamed = a.clone();
        renamed.name = "other".into();
        assert!(!same_content(&a, &renamed));

        let mut with_skill = a.clone();
        with_skill.create_skill("Root", None);
        assert!(!same_content(&a, &with_skill));

        let mut tagged = a.clone();
        tagged.tags.push("rust".into());
        assert!(!same_content(&a, &tagged));
    }
}
