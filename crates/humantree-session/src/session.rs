//! The edit-session controller.
//!
//! [`EditSession`] wraps a loaded tree with a last-saved baseline and walks
//! the `Viewing -> Editing -> Viewing` state machine. Dirtiness is value
//! equality against the baseline (content hash), not edit counting: undoing
//! a change by hand returns the session to clean. Exiting while dirty
//! requires explicit confirmation; losing authorization forces an immediate
//! revert to the baseline.
//!
//! Saves are two-phase so asynchronous persistence can run without holding
//! the session: [`begin_save`](EditSession::begin_save) snapshots the
//! working copy and latches the session against concurrent saves;
//! [`save_succeeded`](EditSession::save_succeeded) /
//! [`save_failed`](EditSession::save_failed) resolve it. The baseline moves
//! only on success.

use serde::{Deserialize, Serialize};

use humantree_core::{SkillTree, TreeError, TreeId};
use humantree_storage::hash::hash_tree;
use humantree_storage::TreeStore;

use crate::error::SessionError;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Viewing,
    Editing,
}

/// Result of asking to leave editing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The session returned to viewing.
    Exited,
    /// Unsaved changes exist; the caller must confirm a discard (or save)
    /// before the session will exit.
    ConfirmationRequired,
}

/// Token for an in-flight save: the snapshot that was handed to the
/// persistence collaborator.
#[derive(Debug, Clone)]
pub struct PendingSave {
    pub tree_id: TreeId,
    pub snapshot: SkillTree,
}

/// One user's live view/edit session over a single tree.
#[derive(Debug)]
pub struct EditSession {
    current: SkillTree,
    baseline: SkillTree,
    baseline_hash: blake3::Hash,
    mode: SessionMode,
    saving: bool,
}

impl EditSession {
    /// Opens a session in viewing mode over a freshly loaded tree.
    pub fn new(tree: SkillTree) -> Self {
        let baseline_hash = hash_tree(&tree);
        EditSession {
            current: tree.clone(),
            baseline: tree,
            baseline_hash,
            mode: SessionMode::Viewing,
            saving: false,
        }
    }

    pub fn tree_id(&self) -> TreeId {
        self.current.id
    }

    /// The working copy.
    pub fn tree(&self) -> &SkillTree {
        &self.current
    }

    /// The last-saved copy.
    pub fn baseline(&self) -> &SkillTree {
        &self.baseline
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode == SessionMode::Editing
    }

    /// True when the working copy's content differs from the baseline.
    pub fn is_dirty(&self) -> bool {
        hash_tree(&self.current) != self.baseline_hash
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    // -----------------------------------------------------------------------
    // Mode transitions
    // -----------------------------------------------------------------------

    /// Enters editing mode. `authorized` comes from the authorization
    /// collaborator (creator check); the session only enforces it.
    pub fn begin_editing(&mut self, authorized: bool) -> Result<(), SessionError> {
        if !authorized {
            return Err(SessionError::NotAuthorized);
        }
        if self.is_editing() {
            return Err(SessionError::AlreadyEditing);
        }
        self.mode = SessionMode::Editing;
        Ok(())
    }

    /// Asks to leave editing mode. Clean sessions exit immediately; dirty
    /// ones stay in editing until the caller confirms.
    pub fn request_exit(&mut self) -> ExitOutcome {
        if !self.is_editing() {
            return ExitOutcome::Exited;
        }
        if self.is_dirty() {
            return ExitOutcome::ConfirmationRequired;
        }
        self.mode = SessionMode::Viewing;
        ExitOutcome::Exited
    }

    /// Confirmed discard: the working copy reverts to the baseline and the
    /// session returns to viewing.
    pub fn discard_and_exit(&mut self) {
        self.current = self.baseline.clone();
        self.mode = SessionMode::Viewing;
    }

    /// Forced exit for externally revoked authorization: in-progress edits
    /// are dropped without confirmation, since there is no longer a channel
    /// to save them.
    pub fn revoke_authorization(&mut self) {
        if self.is_editing() {
            self.current = self.baseline.clone();
            self.mode = SessionMode::Viewing;
            self.saving = false;
        }
    }

    // -----------------------------------------------------------------------
    // Navigation guard
    // -----------------------------------------------------------------------

    /// Blocking predicate for navigation interception: route changes away
    /// from a dirty editing session must be held for confirmation.
    pub fn navigation_blocked(&self) -> bool {
        self.is_editing() && self.is_dirty()
    }

    /// Resolves an intercepted navigation. Proceeding discards the working
    /// copy and exits; canceling leaves the session untouched. Returns
    /// whether navigation may continue.
    pub fn resolve_navigation(&mut self, proceed: bool) -> bool {
        if !self.navigation_blocked() {
            return true;
        }
        if proceed {
            self.discard_and_exit();
        }
        proceed
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// The session's single write path. Applies `f` to a scratch copy of
    /// the working tree and swaps it in only on success, so a multi-step
    /// edit that fails midway leaves nothing behind.
    pub fn edit<T>(
        &mut self,
        f: impl FnOnce(&mut SkillTree) -> Result<T, TreeError>,
    ) -> Result<T, SessionError> {
        if !self.is_editing() {
            return Err(SessionError::NotEditing);
        }
        let mut scratch = self.current.clone();
        let value = f(&mut scratch)?;
        self.current = scratch;
        Ok(value)
    }

    // -----------------------------------------------------------------------
    // Save lifecycle
    // -----------------------------------------------------------------------

    /// Latches the session for saving and returns the snapshot to persist.
    /// A second save cannot start until the first resolves.
    pub fn begin_save(&mut self) -> Result<PendingSave, SessionError> {
        if !self.is_editing() {
            return Err(SessionError::NotEditing);
        }
        if self.saving {
            return Err(SessionError::SaveInFlight);
        }
        self.saving = true;
        Ok(PendingSave {
            tree_id: self.current.id,
            snapshot: self.current.clone(),
        })
    }

    /// Reconciles a successful save. `saved` is the tree as persisted,
    /// with session-local IDs remapped; it becomes the new baseline. The
    /// working copy adopts it too unless further edits arrived while the
    /// save was in flight, in which case those edits survive and the
    /// session stays dirty against the new baseline.
    pub fn save_succeeded(&mut self, pending: &PendingSave, saved: SkillTree) -> Result<(), SessionError> {
        if !self.saving {
            return Err(SessionError::NoSaveInFlight);
        }
        self.saving = false;
        let untouched_since_snapshot = hash_tree(&self.current) == hash_tree(&pending.snapshot);
        self.baseline = saved;
        self.baseline_hash = hash_tree(&self.baseline);
        if untouched_since_snapshot {
            self.current = self.baseline.clone();
        }
        Ok(())
    }

    /// Releases the latch after a failed save. The working copy is
    /// untouched and the session remains dirty; retrying is up to the user.
    pub fn save_failed(&mut self) -> Result<(), SessionError> {
        if !self.saving {
            return Err(SessionError::NoSaveInFlight);
        }
        self.saving = false;
        Ok(())
    }

    /// Convenience for synchronous stores: runs the full save lifecycle
    /// against `store` in one call.
    pub fn save_with<S: TreeStore>(&mut self, store: &mut S) -> Result<(), SessionError> {
        let pending = self.begin_save()?;
        match store.save_tree(pending.tree_id, &pending.snapshot) {
            Ok(saved) => self.save_succeeded(&pending, saved),
            Err(err) => {
                self.save_failed()?;
                Err(SessionError::Save(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use humantree_core::{SkillId, TreeId};
    use humantree_storage::{MemStore, StorageError};

    fn seeded_store() -> (MemStore, TreeId) {
        let mut store = MemStore::new();
        let id = store.create_tree("Guitar", None, "alice", &[]).unwrap();
        let mut tree = store.load_tree(id).unwrap();
        let root = tree.create_skill("Open chords", None);
        let child = tree.create_skill("Barre chords", None);
        tree.add_unlock_edge(root, child).unwrap();
        store.save_tree(id, &tree).unwrap();
        (store, id)
    }

    fn editing_session(store: &MemStore, id: TreeId) -> EditSession {
        let mut session = EditSession::new(store.load_tree(id).unwrap());
        session.begin_editing(true).unwrap();
        session
    }

    #[test]
    fn begin_editing_requires_authorization() {
        let (store, id) = seeded_store();
        let mut session = EditSession::new(store.load_tree(id).unwrap());
        assert!(matches!(
            session.begin_editing(false),
            Err(SessionError::NotAuthorized)
        ));
        assert_eq!(session.mode(), SessionMode::Viewing);

        session.begin_editing(true).unwrap();
        assert!(session.is_editing());
        assert!(matches!(
            session.begin_editing(true),
            Err(SessionError::AlreadyEditing)
        ));
    }

    #[test]
    fn edits_require_editing_mode() {
        let (store, id) = seeded_store();
        let mut session = EditSession::new(store.load_tree(id).unwrap());
        let result = session.edit(|tree| {
            tree.create_skill("nope", None);
            Ok(())
        });
        assert!(matches!(result, Err(SessionError::NotEditing)));
        assert_eq!(session.tree().skills.len(), 2);
    }

    #[test]
    fn dirtiness_is_value_equality_not_edit_counting() {
        let (store, id) = seeded_store();
        let mut session = editing_session(&store, id);
        assert!(!session.is_dirty());

        let original_name = session.tree().name.clone();
        session
            .edit(|tree| {
                tree.name = "Renamed".into();
                Ok(())
            })
            .unwrap();
        assert!(session.is_dirty());

        // Undoing the change by hand returns the session to clean.
        session
            .edit(|tree| {
                tree.name = original_name;
                Ok(())
            })
            .unwrap();
        assert!(!session.is_dirty());
    }

    #[test]
    fn failed_edit_closures_leave_no_trace() {
        let (store, id) = seeded_store();
        let mut session = editing_session(&store, id);
        let before = session.tree().clone();

        let result: Result<(), SessionError> = session.edit(|tree| {
            tree.create_skill("halfway", None);
            // Second step fails: deleting the root is rejected.
            let root = tree.root().map(|r| r.id).unwrap_or(SkillId(0));
            tree.delete_skill(root)?;
            Ok(())
        });
        assert!(matches!(result, Err(SessionError::Edit(_))));
        assert_eq!(session.tree(), &before, "scratch copy must be dropped whole");
        assert!(!session.is_dirty());
    }

    #[test]
    fn clean_exit_is_immediate_dirty_exit_needs_confirmation() {
        let (store, id) = seeded_store();
        let mut session = editing_session(&store, id);
        assert_eq!(session.request_exit(), ExitOutcome::Exited);

        let mut session = editing_session(&store, id);
        session
            .edit(|tree| {
                tree.create_skill("extra", None);
                Ok(())
            })
            .unwrap();
        assert_eq!(session.request_exit(), ExitOutcome::ConfirmationRequired);
        assert!(session.is_editing());

        session.discard_and_exit();
        assert_eq!(session.mode(), SessionMode::Viewing);
        assert_eq!(session.tree(), session.baseline());
        assert!(!session.is_dirty());
    }

    #[test]
    fn navigation_guard_blocks_and_resolves() {
        let (store, id) = seeded_store();
        let mut session = editing_session(&store, id);
        assert!(!session.navigation_blocked());

        session
            .edit(|tree| {
                tree.create_skill("extra", None);
                Ok(())
            })
            .unwrap();
        assert!(session.navigation_blocked());

        // Cancel keeps the session exactly where it was.
        assert!(!session.resolve_navigation(false));
        assert!(session.is_editing());
        assert!(session.is_dirty());

        // Proceed discards and releases the navigation.
        assert!(session.resolve_navigation(true));
        assert_eq!(session.mode(), SessionMode::Viewing);
        assert!(!session.is_dirty());
    }

    #[test]
    fn save_reconciles_baseline_and_remaps_ids() {
        let (mut store, id) = seeded_store();
        let mut session = editing_session(&store, id);
        let root = session.tree().root().unwrap().id;
        let fresh = session
            .edit(|tree| {
                let fresh = tree.create_skill("Sweep picking", None);
                tree.add_unlock_edge(root, fresh)?;
                Ok(fresh)
            })
            .unwrap();
        assert!(fresh.is_local());
        assert!(session.is_dirty());

        session.save_with(&mut store).unwrap();
        assert!(!session.is_dirty());
        assert!(!session.is_saving());
        // The working copy adopted the persisted IDs.
        assert!(session.tree().skills.iter().all(|s| s.id.is_persisted()));
        assert_eq!(session.tree(), session.baseline());
        assert_eq!(session.tree(), &store.load_tree(id).unwrap());
    }

    #[test]
    fn failed_save_stays_dirty_and_allows_retry() {
        struct FailingStore;
        impl TreeStore for FailingStore {
            fn create_tree(
                &mut self,
                _: &str,
                _: Option<&str>,
                _: &str,
                _: &[String],
            ) -> Result<TreeId, StorageError> {
                unreachable!("not used")
            }
            fn load_tree(&self, id: TreeId) -> Result<humantree_core::SkillTree, StorageError> {
                Err(StorageError::TreeNotFound(id.0))
            }
            fn save_tree(
                &mut self,
                id: TreeId,
                _: &humantree_core::SkillTree,
            ) -> Result<humantree_core::SkillTree, StorageError> {
                Err(StorageError::TreeNotFound(id.0))
            }
            fn delete_tree(&mut self, _: TreeId) -> Result<(), StorageError> {
                unreachable!("not used")
            }
            fn list_trees(&self) -> Result<Vec<humantree_storage::TreeSummary>, StorageError> {
                Ok(Vec::new())
            }
        }

        let (store, id) = seeded_store();
        let mut session = editing_session(&store, id);
        session
            .edit(|tree| {
                tree.create_skill("extra", None);
                Ok(())
            })
            .unwrap();

        let err = session.save_with(&mut FailingStore).unwrap_err();
        assert!(matches!(err, SessionError::Save(_)));
        assert!(session.is_dirty(), "failure must not move the baseline");
        assert!(session.is_editing());
        assert!(!session.is_saving(), "latch must release for retry");

        // Retry against the real store succeeds.
        let mut store = store;
        session.save_with(&mut store).unwrap();
        assert!(!session.is_dirty());
    }

    #[test]
    fn concurrent_saves_are_rejected() {
        let (store, id) = seeded_store();
        let mut session = editing_session(&store, id);
        let pending = session.begin_save().unwrap();
        assert!(matches!(
            session.begin_save(),
            Err(SessionError::SaveInFlight)
        ));
        session.save_failed().unwrap();
        assert!(matches!(
            session.save_failed(),
            Err(SessionError::NoSaveInFlight)
        ));
        drop(pending);
    }

    #[test]
    fn edits_during_inflight_save_survive_reconciliation() {
        let (mut store, id) = seeded_store();
        let mut session = editing_session(&store, id);
        session
            .edit(|tree| {
                tree.name = "Renamed".into();
                Ok(())
            })
            .unwrap();

        let pending = session.begin_save().unwrap();

        // Another edit lands while the save is in flight.
        session
            .edit(|tree| {
                tree.description = Some("late edit".into());
                Ok(())
            })
            .unwrap();

        let saved = store.save_tree(pending.tree_id, &pending.snapshot).unwrap();
        session.save_succeeded(&pending, saved).unwrap();

        // Baseline reflects the save; the late edit is still pending.
        assert_eq!(session.baseline().name, "Renamed");
        assert_eq!(session.tree().description.as_deref(), Some("late edit"));
        assert!(session.is_dirty());
    }

    #[test]
    fn revoked_authorization_forces_discard() {
        let (store, id) = seeded_store();
        let mut session = editing_session(&store, id);
        session
            .edit(|tree| {
                tree.create_skill("extra", None);
                Ok(())
            })
            .unwrap();
        assert!(session.is_dirty());

        session.revoke_authorization();
        assert_eq!(session.mode(), SessionMode::Viewing);
        assert!(!session.is_dirty());
        assert_eq!(session.tree(), session.baseline());
    }
}
