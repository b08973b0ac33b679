//! TreeService: the single coordinator between HTTP handlers and the
//! core/storage/session crates.
//!
//! All business logic flows through [`TreeService`]. Handlers are thin
//! wrappers that delegate to these methods. The service owns the SQLite
//! store and the live edit sessions; rendering snapshots are taken here and
//! laid out outside the service lock (see the state module).

use std::collections::HashMap;

use humantree_core::{tags, SkillId, SkillTree, TreeId, UserProgress};
use humantree_session::{EditSession, ExitOutcome, SessionMode};
use humantree_storage::{ProgressStore, SqliteStore, TreeStore, TreeSummary};
use humantree_view::LinkedStats;

use crate::error::ApiError;
use crate::schema::sessions::{Mutation, MutationResponse, SessionView};

/// Everything one graph render needs, captured under the service lock.
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    pub tree: SkillTree,
    pub progress: Option<UserProgress>,
    pub linked_stats: HashMap<TreeId, LinkedStats>,
}

/// The central service coordinating tree CRUD, progress, rendering
/// snapshots, and edit sessions.
pub struct TreeService {
    store: SqliteStore,
    /// Live edit sessions, one per tree. A session exists only while a
    /// creator is editing; viewers read straight from the store.
    sessions: HashMap<TreeId, EditSession>,
}

impl TreeService {
    /// Opens the service over a SQLite database at `db_path`.
    pub fn new(db_path: &str) -> Result<Self, ApiError> {
        let store = SqliteStore::new(db_path)
            .map_err(|e| ApiError::InternalError(format!("failed to open store: {}", e)))?;
        Ok(TreeService {
            store,
            sessions: HashMap::new(),
        })
    }

    /// Service over an in-memory database (tests).
    pub fn in_memory() -> Result<Self, ApiError> {
        let store = SqliteStore::in_memory()
            .map_err(|e| ApiError::InternalError(format!("failed to open store: {}", e)))?;
        Ok(TreeService {
            store,
            sessions: HashMap::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Tree management
    // -----------------------------------------------------------------------

    pub fn list_trees(&self) -> Result<Vec<TreeSummary>, ApiError> {
        Ok(self.store.list_trees()?)
    }

    /// Creates a tree after normalizing its tags.
    pub fn create_tree(
        &mut self,
        name: &str,
        description: Option<&str>,
        creator: &str,
        raw_tags: &[String],
    ) -> Result<TreeSummary, ApiError> {
        let tags = tags::normalize(raw_tags)?;
        let id = self.store.create_tree(name, description, creator, &tags)?;
        tracing::info!(tree = id.0, creator, "tree created");
        Ok(TreeSummary {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            creator: creator.to_string(),
            tags,
        })
    }

    /// Loads a tree. Viewers see the stored state even while the creator
    /// has unsaved edits in a session.
    pub fn get_tree(&self, id: TreeId) -> Result<SkillTree, ApiError> {
        Ok(self.store.load_tree(id)?)
    }

    pub fn delete_tree(&mut self, id: TreeId, actor: &str) -> Result<(), ApiError> {
        self.check_creator(id, actor)?;
        self.store.delete_tree(id)?;
        self.sessions.remove(&id);
        tracing::info!(tree = id.0, actor, "tree deleted");
        Ok(())
    }

    /// Full-state save (the non-session path). Validates, remaps local
    /// IDs, and persists. Any live session is reset to the saved state,
    /// since this write is authoritative for the whole tree.
    pub fn save_tree(
        &mut self,
        id: TreeId,
        tree: &SkillTree,
        actor: &str,
    ) -> Result<SkillTree, ApiError> {
        self.check_creator(id, actor)?;
        let tags = tags::normalize(&tree.tags)?;
        let mut payload = tree.clone();
        payload.tags = tags;
        let saved = self.store.save_tree(id, &payload)?;
        if self.sessions.contains_key(&id) {
            self.sessions.insert(id, EditSession::new(saved.clone()));
        }
        tracing::info!(tree = id.0, skills = saved.skills.len(), "tree saved");
        Ok(saved)
    }

    // -----------------------------------------------------------------------
    // Progress
    // -----------------------------------------------------------------------

    pub fn skills_checked(&self, user: &str) -> Result<UserProgress, ApiError> {
        Ok(self.store.skills_checked(user)?)
    }

    pub fn set_skill_checked(
        &mut self,
        user: &str,
        skill: SkillId,
        checked: bool,
    ) -> Result<(), ApiError> {
        Ok(self.store.set_skill_checked(user, skill, checked)?)
    }

    // -----------------------------------------------------------------------
    // Rendering snapshots
    // -----------------------------------------------------------------------

    /// Captures everything a render pass needs. The tree is the session's
    /// working copy when one is live (the editor sees their edits),
    /// otherwise the stored state. Linked-tree stats are computed per
    /// portal skill; trees that fail to load are omitted, so "unknown"
    /// stays distinct from "zero progress".
    pub fn graph_snapshot(
        &self,
        id: TreeId,
        user: Option<&str>,
    ) -> Result<GraphSnapshot, ApiError> {
        let tree = match self.sessions.get(&id) {
            Some(session) => session.tree().clone(),
            None => self.store.load_tree(id)?,
        };

        let progress = match user {
            Some(user) => Some(self.store.skills_checked(user)?),
            None => None,
        };

        let mut linked_stats = HashMap::new();
        let checked = progress.clone().unwrap_or_default();
        for linked_id in tree.skills.iter().filter_map(|s| s.linked_tree_id) {
            let Ok(linked) = self.store.load_tree(linked_id) else {
                continue;
            };
            let total = linked.skills.len() as u32;
            let done = linked
                .skills
                .iter()
                .filter(|s| checked.contains(s.id))
                .count() as u32;
            linked_stats.insert(
                linked_id,
                LinkedStats {
                    checked: done,
                    total,
                },
            );
        }

        Ok(GraphSnapshot {
            tree,
            progress,
            linked_stats,
        })
    }

    /// Gesture gate for the editor's drag-to-connect preview.
    pub fn is_valid_connection(
        &self,
        id: TreeId,
        source: SkillId,
        target: SkillId,
    ) -> Result<bool, ApiError> {
        let tree = match self.sessions.get(&id) {
            Some(session) => session.tree().clone(),
            None => self.store.load_tree(id)?,
        };
        Ok(tree.is_valid_connection(source, target))
    }

    // -----------------------------------------------------------------------
    // Edit sessions
    // -----------------------------------------------------------------------

    /// Starts editing a tree: creates the session if needed and moves it to
    /// editing mode. Only the creator may edit.
    pub fn begin_session(&mut self, id: TreeId, actor: &str) -> Result<SessionView, ApiError> {
        let authorized = self.is_creator(id, actor)?;
        if !authorized {
            return Err(humantree_session::SessionError::NotAuthorized.into());
        }
        if !self.sessions.contains_key(&id) {
            let tree = self.store.load_tree(id)?;
            self.sessions.insert(id, EditSession::new(tree));
        }
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| ApiError::InternalError("session vanished".into()))?;
        session.begin_editing(authorized)?;
        tracing::info!(tree = id.0, actor, "edit session started");
        Ok(Self::view(session))
    }

    pub fn session_status(&self, id: TreeId) -> Result<SessionView, ApiError> {
        let session = self
            .sessions
            .get(&id)
            .ok_or_else(|| ApiError::NotFound(format!("no session for tree {}", id.0)))?;
        Ok(Self::view(session))
    }

    /// Applies a mutation batch to the session's working copy.
    ///
    /// All-or-nothing: the batch runs against a scratch copy and replaces
    /// the working tree only if every mutation passes. Rejections come back
    /// as `valid = false` rather than an HTTP error, since they are routine
    /// during interactive editing. `dry_run` validates without committing.
    pub fn apply_mutations(
        &mut self,
        id: TreeId,
        actor: &str,
        mutations: &[Mutation],
        dry_run: bool,
    ) -> Result<MutationResponse, ApiError> {
        // Defensive recheck behind the UI's own gate.
        if !self.is_creator(id, actor)? {
            return Err(ApiError::Forbidden("only the creator may edit".into()));
        }
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("no session for tree {}", id.0)))?;

        if dry_run {
            if !session.is_editing() {
                return Err(ApiError::Conflict("session is not editing".into()));
            }
            let mut scratch = session.tree().clone();
            return Ok(match apply_all(&mut scratch, mutations) {
                Ok(created) => MutationResponse {
                    valid: true,
                    created,
                    error: None,
                    committed: false,
                },
                Err(err) => MutationResponse {
                    valid: false,
                    created: Vec::new(),
                    error: Some(err.to_string()),
                    committed: false,
                },
            });
        }

        match session.edit(|tree| apply_all(tree, mutations)) {
            Ok(created) => Ok(MutationResponse {
                valid: true,
                created,
                error: None,
                committed: true,
            }),
            Err(humantree_session::SessionError::Edit(err)) => Ok(MutationResponse {
                valid: false,
                created: Vec::new(),
                error: Some(err.to_string()),
                committed: false,
            }),
            Err(other) => Err(other.into()),
        }
    }

    /// Persists the session's working copy and reconciles the baseline.
    pub fn save_session(&mut self, id: TreeId, actor: &str) -> Result<SessionView, ApiError> {
        if !self.is_creator(id, actor)? {
            return Err(ApiError::Forbidden("only the creator may save".into()));
        }
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("no session for tree {}", id.0)))?;
        session.save_with(&mut self.store)?;
        tracing::info!(tree = id.0, actor, "session saved");
        Ok(Self::view(session))
    }

    /// Leaves editing mode. A dirty session refuses unless `discard` is
    /// set; discarding restores the baseline. Ended sessions are dropped,
    /// so later readers fall back to the store.
    pub fn exit_session(
        &mut self,
        id: TreeId,
        discard: bool,
    ) -> Result<SessionView, ApiError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("no session for tree {}", id.0)))?;

        match session.request_exit() {
            ExitOutcome::Exited => {}
            ExitOutcome::ConfirmationRequired if discard => session.discard_and_exit(),
            ExitOutcome::ConfirmationRequired => {
                return Err(ApiError::Conflict(
                    "unsaved changes; save or pass discard=true".into(),
                ));
            }
        }

        let view = Self::view(session);
        if session.mode() == SessionMode::Viewing {
            self.sessions.remove(&id);
        }
        Ok(view)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn view(session: &EditSession) -> SessionView {
        SessionView {
            tree_id: session.tree_id(),
            mode: session.mode(),
            dirty: session.is_dirty(),
            saving: session.is_saving(),
        }
    }

    fn is_creator(&self, id: TreeId, actor: &str) -> Result<bool, ApiError> {
        let creator = match self.sessions.get(&id) {
            Some(session) => session.tree().creator.clone(),
            None => self.store.load_tree(id)?.creator,
        };
        Ok(creator == actor)
    }

    fn check_creator(&self, id: TreeId, actor: &str) -> Result<(), ApiError> {
        if !self.is_creator(id, actor)? {
            return Err(ApiError::Forbidden("only the creator may do this".into()));
        }
        Ok(())
    }
}

/// Applies a batch of mutations in order, returning created skill IDs.
fn apply_all(
    tree: &mut SkillTree,
    mutations: &[Mutation],
) -> Result<Vec<SkillId>, humantree_core::TreeError> {
    let mut created = Vec::new();
    for mutation in mutations {
        match mutation {
            Mutation::AddEdge { source, target } => {
                tree.add_unlock_edge(*source, *target)?;
            }
            Mutation::RemoveEdge { source, target } => {
                tree.remove_unlock_edge(*source, *target);
            }
            Mutation::ReconnectEdge {
                old_source,
                old_target,
                new_source,
                new_target,
            } => {
                tree.reconnect_unlock_edge(*old_source, *old_target, *new_source, *new_target)?;
            }
            Mutation::CreateSkill { name, description } => {
                created.push(tree.create_skill(name.clone(), description.clone()));
            }
            Mutation::CreateLinkedSkill {
                name,
                linked_tree_id,
            } => {
                created.push(tree.create_linked_skill(name.clone(), *linked_tree_id));
            }
            Mutation::DeleteSkill { id } => {
                tree.delete_skill(*id)?;
            }
            Mutation::UpdateSkill {
                id,
                name,
                description,
            } => {
                let skill = tree
                    .skill_mut(*id)
                    .ok_or(humantree_core::TreeError::SkillNotFound { id: *id })?;
                if let Some(name) = name {
                    skill.name = name.clone();
                }
                if let Some(description) = description {
                    skill.description = Some(description.clone());
                }
            }
            Mutation::UpdateTree { name, description } => {
                if let Some(name) = name {
                    tree.name = name.clone();
                }
                if let Some(description) = description {
                    tree.description = Some(description.clone());
                }
            }
            Mutation::SetTags { tags: raw } => {
                tree.tags = tags::normalize(raw)?;
            }
        }
    }
    Ok(created)
}
