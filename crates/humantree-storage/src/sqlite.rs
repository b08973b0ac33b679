//! SQLite implementation of the storage traits.
//!
//! Trees decompose into rows: one per tree, skill, unlock edge, tag, and
//! progress mark. Foreign keys cascade, so deleting a skill (or a whole
//! tree) takes its unlock edges and progress rows with it. Saves run in a
//! single transaction; the `AUTOINCREMENT` key on `skills` is what turns
//! session-local negative IDs into persisted positive ones.

use rusqlite::{params, Connection, OptionalExtension};

use humantree_core::{Skill, SkillId, SkillTree, TreeId, UserProgress};

use crate::convert::{remap_local_ids, validate_for_save};
use crate::error::StorageError;
use crate::schema;
use crate::traits::{ProgressStore, TreeStore};
use crate::types::TreeSummary;

/// SQLite-backed tree and progress storage.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        Ok(SqliteStore {
            conn: schema::open_database(path)?,
        })
    }

    /// Opens a fresh in-memory database (tests, ephemeral sessions).
    pub fn in_memory() -> Result<Self, StorageError> {
        Ok(SqliteStore {
            conn: schema::open_in_memory()?,
        })
    }

    fn load_tags(conn: &Connection, id: TreeId) -> Result<Vec<String>, StorageError> {
        let mut stmt =
            conn.prepare("SELECT tag FROM tree_tags WHERE tree_id = ?1 ORDER BY ordinal")?;
        let tags = stmt
            .query_map(params![id.0], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }
}

impl TreeStore for SqliteStore {
    fn create_tree(
        &mut self,
        name: &str,
        description: Option<&str>,
        creator: &str,
        tags: &[String],
    ) -> Result<TreeId, StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO trees (name, description, creator) VALUES (?1, ?2, ?3)",
            params![name, description, creator],
        )?;
        let id = TreeId(tx.last_insert_rowid());
        for (ordinal, tag) in tags.iter().enumerate() {
            tx.execute(
                "INSERT INTO tree_tags (tree_id, tag, ordinal) VALUES (?1, ?2, ?3)",
                params![id.0, tag, ordinal as i64],
            )?;
        }
        tx.commit()?;
        Ok(id)
    }

    fn load_tree(&self, id: TreeId) -> Result<SkillTree, StorageError> {
        let header = self
            .conn
            .query_row(
                "SELECT name, description, creator FROM trees WHERE id = ?1",
                params![id.0],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?
            .ok_or(StorageError::TreeNotFound(id.0))?;

        let mut tree = SkillTree::new(id, header.0, header.2);
        tree.description = header.1;
        tree.tags = Self::load_tags(&self.conn, id)?;

        let mut skill_stmt = self.conn.prepare(
            "SELECT id, name, description, is_root, linked_tree_id
             FROM skills WHERE tree_id = ?1 ORDER BY position",
        )?;
        let skills = skill_stmt
            .query_map(params![id.0], |row| {
                Ok(Skill {
                    id: SkillId(row.get::<_, i64>(0)?),
                    name: row.get(1)?,
                    description: row.get(2)?,
                    is_root: row.get(3)?,
                    unlock_ids: Default::default(),
                    linked_tree_id: row.get::<_, Option<i64>>(4)?.map(TreeId),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        tree.skills = skills;

        let mut unlock_stmt = self.conn.prepare(
            "SELECT unlocks_id FROM skill_unlocks WHERE skill_id = ?1 ORDER BY ordinal",
        )?;
        for skill in &mut tree.skills {
            let unlocks = unlock_stmt
                .query_map(params![skill.id.0], |row| row.get::<_, i64>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            skill.unlock_ids = unlocks.into_iter().map(SkillId).collect();
        }

        Ok(tree)
    }

    fn save_tree(&mut self, id: TreeId, tree: &SkillTree) -> Result<SkillTree, StorageError> {
        validate_for_save(tree)?;
        let tx = self.conn.transaction()?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM trees WHERE id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StorageError::TreeNotFound(id.0));
        }

        let existing: Vec<i64> = {
            let mut stmt = tx.prepare("SELECT id FROM skills WHERE tree_id = ?1")?;
            let ids = stmt
                .query_map(params![id.0], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };
        for skill in tree.skills.iter().filter(|s| s.id.is_persisted()) {
            if !existing.contains(&skill.id.0) {
                return Err(StorageError::SkillNotFound {
                    tree: id.0,
                    skill: skill.id.0,
                });
            }
        }

        tx.execute(
            "UPDATE trees SET name = ?1, description = ?2 WHERE id = ?3",
            params![tree.name, tree.description, id.0],
        )?;

        tx.execute("DELETE FROM tree_tags WHERE tree_id = ?1", params![id.0])?;
        for (ordinal, tag) in tree.tags.iter().enumerate() {
            tx.execute(
                "INSERT INTO tree_tags (tree_id, tag, ordinal) VALUES (?1, ?2, ?3)",
                params![id.0, tag, ordinal as i64],
            )?;
        }

        // Inserting a row is what assigns the persisted ID for local skills.
        let saved = remap_local_ids(id, tree, |skill| {
            tx.execute(
                "INSERT INTO skills (tree_id, name, description, is_root, linked_tree_id, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                params![
                    id.0,
                    skill.name,
                    skill.description,
                    skill.is_root,
                    skill.linked_tree_id.map(|t| t.0),
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })?;

        // Stored skills missing from the payload are deleted; the cascade
        // removes their unlock edges and progress rows.
        for old in &existing {
            if saved.skill(SkillId(*old)).is_none() {
                tx.execute("DELETE FROM skills WHERE id = ?1", params![old])?;
            }
        }

        for (position, skill) in saved.skills.iter().enumerate() {
            tx.execute(
                "UPDATE skills SET name = ?1, description = ?2, is_root = ?3,
                 linked_tree_id = ?4, position = ?5 WHERE id = ?6",
                params![
                    skill.name,
                    skill.description,
                    skill.is_root,
                    skill.linked_tree_id.map(|t| t.0),
                    position as i64,
                    skill.id.0,
                ],
            )?;
        }

        tx.execute(
            "DELETE FROM skill_unlocks
             WHERE skill_id IN (SELECT id FROM skills WHERE tree_id = ?1)",
            params![id.0],
        )?;
        for skill in &saved.skills {
            for (ordinal, unlock) in skill.unlock_ids.iter().enumerate() {
                tx.execute(
                    "INSERT INTO skill_unlocks (skill_id, unlocks_id, ordinal)
                     VALUES (?1, ?2, ?3)",
                    params![skill.id.0, unlock.0, ordinal as i64],
                )?;
            }
        }

        tx.commit()?;
        Ok(saved)
    }

    fn delete_tree(&mut self, id: TreeId) -> Result<(), StorageError> {
        let affected = self
            .conn
            .execute("DELETE FROM trees WHERE id = ?1", params![id.0])?;
        if affected == 0 {
            return Err(StorageError::TreeNotFound(id.0));
        }
        Ok(())
    }

    fn list_trees(&self) -> Result<Vec<TreeSummary>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, creator FROM trees ORDER BY id")?;
        let headers = stmt
            .query_map([], |row| {
                Ok((
                    TreeId(row.get::<_, i64>(0)?),
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut summaries = Vec::with_capacity(headers.len());
        for (id, name, description, creator) in headers {
            summaries.push(TreeSummary {
                id,
                name,
                description,
                creator,
                tags: Self::load_tags(&self.conn, id)?,
            });
        }
        Ok(summaries)
    }
}

impl ProgressStore for SqliteStore {
    fn skills_checked(&self, user: &str) -> Result<UserProgress, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT skill_id FROM user_checked_skills WHERE user = ?1")?;
        let ids = stmt
            .query_map(params![user], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(UserProgress {
            skill_ids: ids.into_iter().map(SkillId).collect(),
        })
    }

    fn set_skill_checked(
        &mut self,
        user: &str,
        skill: SkillId,
        checked: bool,
    ) -> Result<(), StorageError> {
        if checked {
            let known: Option<i64> = self
                .conn
                .query_row(
                    "SELECT id FROM skills WHERE id = ?1",
                    params![skill.0],
                    |row| row.get(0),
                )
                .optional()?;
            if known.is_none() {
                return Err(StorageError::SkillNotFound {
                    tree: 0,
                    skill: skill.0,
                });
            }
            self.conn.execute(
                "INSERT OR IGNORE INTO user_checked_skills (user, skill_id) VALUES (?1, ?2)",
                params![user, skill.0],
            )?;
        } else {
            self.conn.execute(
                "DELETE FROM user_checked_skills WHERE user = ?1 AND skill_id = ?2",
                params![user, skill.0],
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(store: &mut SqliteStore) -> TreeId {
        let id = store
            .create_tree("Guitar", Some("strings"), "alice", &["music".into()])
            .unwrap();
        let mut tree = store.load_tree(id).unwrap();
        let root = tree.create_skill("Open chords", None);
        let a = tree.create_skill("Barre chords", None);
        let b = tree.create_skill("Fingerpicking", None);
        tree.add_unlock_edge(root, a).unwrap();
        tree.add_unlock_edge(root, b).unwrap();
        store.save_tree(id, &tree).unwrap();
        id
    }

    #[test]
    fn create_and_load_roundtrip() {
        let mut store = SqliteStore::in_memory().unwrap();
        let id = seeded(&mut store);

        let tree = store.load_tree(id).unwrap();
        assert_eq!(tree.name, "Guitar");
        assert_eq!(tree.creator, "alice");
        assert_eq!(tree.tags, vec!["music"]);
        assert_eq!(tree.skills.len(), 3);
        assert!(tree.skills.iter().all(|s| s.id.is_persisted()));
        assert_eq!(tree.root().unwrap().name, "Open chords");
    }

    #[test]
    fn unlock_and_skill_order_survive_reload() {
        let mut store = SqliteStore::in_memory().unwrap();
        let id = seeded(&mut store);

        let tree = store.load_tree(id).unwrap();
        let names: Vec<&str> = tree.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Open chords", "Barre chords", "Fingerpicking"]);

        let root = tree.root().unwrap();
        let targets: Vec<&str> = root
            .unlock_ids
            .iter()
            .map(|u| tree.skill(*u).unwrap().name.as_str())
            .collect();
        assert_eq!(targets, vec!["Barre chords", "Fingerpicking"]);
    }

    #[test]
    fn load_missing_tree_errors() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(matches!(
            store.load_tree(TreeId(42)),
            Err(StorageError::TreeNotFound(42))
        ));
    }

    #[test]
    fn resave_mixes_persisted_and_local_skills() {
        let mut store = SqliteStore::in_memory().unwrap();
        let id = seeded(&mut store);

        let mut tree = store.load_tree(id).unwrap();
        let root = tree.root().unwrap().id;
        let fresh = tree.create_skill("Sweep picking", None);
        assert!(fresh.is_local());
        tree.add_unlock_edge(root, fresh).unwrap();

        let saved = store.save_tree(id, &tree).unwrap();
        assert_eq!(saved.skills.len(), 4);
        assert!(saved.skills.iter().all(|s| s.id.is_persisted()));

        let reloaded = store.load_tree(id).unwrap();
        assert_eq!(reloaded, saved);
    }

    #[test]
    fn save_rejects_invalid_root_structure() {
        let mut store = SqliteStore::in_memory().unwrap();
        let id = seeded(&mut store);
        let mut tree = store.load_tree(id).unwrap();
        for skill in &mut tree.skills {
            skill.is_root = false;
        }
        assert!(matches!(
            store.save_tree(id, &tree),
            Err(StorageError::InvalidTree { .. })
        ));
    }

    #[test]
    fn save_rejects_unknown_persisted_skill() {
        let mut store = SqliteStore::in_memory().unwrap();
        let id = seeded(&mut store);
        let mut tree = store.load_tree(id).unwrap();
        tree.skills.push(Skill::new(SkillId(999), "ghost", None));
        assert!(matches!(
            store.save_tree(id, &tree),
            Err(StorageError::SkillNotFound { skill: 999, .. })
        ));
    }

    #[test]
    fn deleting_a_skill_cascades_to_progress() {
        let mut store = SqliteStore::in_memory().unwrap();
        let id = seeded(&mut store);
        let tree = store.load_tree(id).unwrap();
        let leaf = tree.skills[2].id;

        store.set_skill_checked("bob", leaf, true).unwrap();
        assert!(store.skills_checked("bob").unwrap().contains(leaf));

        let mut edited = tree.clone();
        edited.delete_skill(leaf).unwrap();
        store.save_tree(id, &edited).unwrap();

        assert!(!store.skills_checked("bob").unwrap().contains(leaf));
        assert_eq!(store.load_tree(id).unwrap().skills.len(), 2);
    }

    #[test]
    fn delete_tree_cascades_everything() {
        let mut store = SqliteStore::in_memory().unwrap();
        let id = seeded(&mut store);
        let root = store.load_tree(id).unwrap().root().unwrap().id;
        store.set_skill_checked("bob", root, true).unwrap();

        store.delete_tree(id).unwrap();
        assert!(matches!(
            store.load_tree(id),
            Err(StorageError::TreeNotFound(_))
        ));
        assert!(store.skills_checked("bob").unwrap().skill_ids.is_empty());
        assert!(matches!(
            store.delete_tree(id),
            Err(StorageError::TreeNotFound(_))
        ));
    }

    #[test]
    fn progress_toggle_is_idempotent() {
        let mut store = SqliteStore::in_memory().unwrap();
        let id = seeded(&mut store);
        let root = store.load_tree(id).unwrap().root().unwrap().id;

        store.set_skill_checked("bob", root, true).unwrap();
        store.set_skill_checked("bob", root, true).unwrap();
        assert_eq!(store.skills_checked("bob").unwrap().skill_ids.len(), 1);

        store.set_skill_checked("bob", root, false).unwrap();
        store.set_skill_checked("bob", root, false).unwrap();
        assert!(store.skills_checked("bob").unwrap().skill_ids.is_empty());
    }

    #[test]
    fn checking_unknown_skill_errors() {
        let mut store = SqliteStore::in_memory().unwrap();
        assert!(matches!(
            store.set_skill_checked("bob", SkillId(1), true),
            Err(StorageError::SkillNotFound { .. })
        ));
    }

    #[test]
    fn list_trees_includes_tags() {
        let mut store = SqliteStore::in_memory().unwrap();
        let a = seeded(&mut store);
        let b = store.create_tree("Piano", None, "bob", &[]).unwrap();

        let listed = store.list_trees().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, a);
        assert_eq!(listed[0].tags, vec!["music"]);
        assert_eq!(listed[1].id, b);
        assert!(listed[1].tags.is_empty());
    }

    #[test]
    fn linked_tree_reference_roundtrips() {
        let mut store = SqliteStore::in_memory().unwrap();
        let sub = store.create_tree("Sub", None, "alice", &[]).unwrap();
        let id = store.create_tree("Main", None, "alice", &[]).unwrap();

        let mut tree = store.load_tree(id).unwrap();
        let root = tree.create_skill("Root", None);
        let portal = tree.create_linked_skill("Sub", sub);
        tree.add_unlock_edge(root, portal).unwrap();
        store.save_tree(id, &tree).unwrap();

        let reloaded = store.load_tree(id).unwrap();
        let portal = reloaded
            .skills
            .iter()
            .find(|s| s.linked_tree_id.is_some())
            .unwrap();
        assert_eq!(portal.linked_tree_id, Some(sub));
    }
}
