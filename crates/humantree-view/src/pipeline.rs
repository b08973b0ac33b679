//! Versioned asynchronous rendering.
//!
//! Hierarchical layout is the one CPU-bound step in the view path, so it
//! runs on the blocking pool instead of the event loop. A generation
//! counter guards against stale application: every tree change bumps the
//! version, and a render started for an older version is discarded when it
//! resolves. Superseded computations are abandoned, not aborted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use humantree_core::{SkillTree, TreeId, UserProgress};

use crate::graph::{to_graph, ColorMode, LinkedStats, RenderGraph, Toggle};

/// Owned snapshot of everything one render pass needs. Cloning the inputs
/// up front keeps the blocking task independent of later edits.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub tree: SkillTree,
    pub mode: ColorMode,
    pub editing: bool,
    pub progress: Option<UserProgress>,
    pub on_toggle: Toggle,
    pub linked_stats: HashMap<TreeId, LinkedStats>,
}

impl RenderRequest {
    pub fn new(tree: SkillTree, mode: ColorMode, editing: bool) -> Self {
        RenderRequest {
            tree,
            mode,
            editing,
            progress: None,
            on_toggle: Toggle::noop(),
            linked_stats: HashMap::new(),
        }
    }
}

/// Generation-counted render coordinator for a single tree view.
///
/// Callers read the version with [`current_version`](Self::current_version)
/// when they snapshot the tree, bump it with
/// [`invalidate`](Self::invalidate) on every change, and pass the snapshot
/// version to [`render`](Self::render). A render whose version is no
/// longer current returns `None` and its result is dropped.
#[derive(Debug, Default)]
pub struct RenderPipeline {
    version: AtomicU64,
}

impl RenderPipeline {
    pub fn new() -> Self {
        RenderPipeline {
            version: AtomicU64::new(0),
        }
    }

    /// The version renders must match to be applied.
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Marks all in-flight renders stale; returns the new version.
    pub fn invalidate(&self) -> u64 {
        self.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Runs the transform (layout included) on the blocking pool.
    ///
    /// Returns `None` when `version` was superseded before or during the
    /// computation; the discarded result is not an error.
    pub async fn render(&self, version: u64, request: RenderRequest) -> Option<RenderGraph> {
        if self.current_version() != version {
            return None;
        }

        let handle = tokio::task::spawn_blocking(move || {
            to_graph(
                &request.tree,
                request.mode,
                request.editing,
                request.progress.as_ref(),
                &request.on_toggle,
                &request.linked_stats,
            )
        });

        let graph = handle.await.ok()?;

        if self.current_version() != version {
            return None;
        }
        Some(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use humantree_core::Skill;
    use humantree_core::SkillId;

    fn small_tree() -> SkillTree {
        let mut tree = SkillTree::new(TreeId(1), "t", "alice");
        tree.skills.push(Skill {
            id: SkillId(1),
            name: "Root".into(),
            description: None,
            is_root: true,
            unlock_ids: [SkillId(2)].into_iter().collect(),
            linked_tree_id: None,
        });
        tree.skills.push(Skill::new(SkillId(2), "Child", None));
        tree
    }

    #[tokio::test]
    async fn current_version_renders_apply() {
        let pipeline = RenderPipeline::new();
        let version = pipeline.current_version();
        let graph = pipeline
            .render(version, RenderRequest::new(small_tree(), ColorMode::Light, false))
            .await
            .expect("current-version render must apply");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
    }

    #[tokio::test]
    async fn superseded_renders_are_discarded() {
        let pipeline = RenderPipeline::new();
        let stale = pipeline.current_version();
        pipeline.invalidate();

        let result = pipeline
            .render(stale, RenderRequest::new(small_tree(), ColorMode::Light, false))
            .await;
        assert!(result.is_none(), "stale render must be dropped silently");
    }

    #[tokio::test]
    async fn invalidate_advances_monotonically() {
        let pipeline = RenderPipeline::new();
        let v1 = pipeline.invalidate();
        let v2 = pipeline.invalidate();
        assert!(v2 > v1);
        assert_eq!(pipeline.current_version(), v2);

        // Only the latest version renders.
        assert!(pipeline
            .render(v1, RenderRequest::new(small_tree(), ColorMode::Dark, true))
            .await
            .is_none());
        assert!(pipeline
            .render(v2, RenderRequest::new(small_tree(), ColorMode::Dark, true))
            .await
            .is_some());
    }
}
