//! The Skill -> Graph transform.
//!
//! One [`GraphNode`] per skill, one [`GraphEdge`] per unlock pair, with
//! display role, progress annotation, and style data attached. Positions
//! are delegated to `humantree-layout`; the transform never computes
//! coordinates itself. Output is deterministic: identical inputs yield
//! identical IDs, roles, and positions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use humantree_core::{SkillId, SkillTree, TreeId, UserProgress};
use humantree_layout::{layout, LayoutEdge, LayoutNode, NodePosition};

/// Fixed node height; width scales with the label (see [`node_width`]).
pub const NODE_HEIGHT: f64 = 72.0;

/// Light/dark rendering mode. Only affects style data on non-root,
/// non-linked nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Light,
    Dark,
}

/// Display role of a node, in priority order: a portal to another tree
/// renders as `Linked` even while editing; otherwise editing mode strips
/// the progress checkbox (`Structural`); otherwise the node is `Trackable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Trackable,
    Structural,
    Linked,
}

/// Progress counts for a linked subtree. Attached to a linked node only
/// when the collaborator supplied an entry; "no data" stays distinct from
/// "zero progress".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedStats {
    pub checked: u32,
    pub total: u32,
}

/// Style data the presentation layer keys off. The engine only decides
/// which bucket a node falls into; the constants mirror the product's
/// node chrome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub background: String,
    pub color: String,
    pub border: String,
    /// Root nodes are emphasized (heavier font, shadow).
    pub emphasis: bool,
}

impl NodeStyle {
    fn for_node(is_root: bool, linked: bool, mode: ColorMode) -> Self {
        if linked {
            return NodeStyle {
                background: "linear-gradient(135deg, #0d9488, #14b8a6)".into(),
                color: "#ffffff".into(),
                border: "2px dashed #5eead4".into(),
                emphasis: false,
            };
        }
        if is_root {
            return NodeStyle {
                background: "linear-gradient(135deg, #6366f1, #8b5cf6)".into(),
                color: "#ffffff".into(),
                border: "2px solid rgba(255, 255, 255, 0.2)".into(),
                emphasis: true,
            };
        }
        match mode {
            ColorMode::Dark => NodeStyle {
                background: "#1e293b".into(),
                color: "#e2e8f0".into(),
                border: "1px solid #475569".into(),
                emphasis: false,
            },
            ColorMode::Light => NodeStyle {
                background: "#ffffff".into(),
                color: "#1f2937".into(),
                border: "1px solid #d1d5db".into(),
                emphasis: false,
            },
        }
    }
}

/// Progress toggle callback, threaded through node data untouched so the
/// presentation layer can wire checkboxes without re-creating closures.
/// Equality is handler identity, which keeps re-transforms comparable.
#[derive(Clone)]
pub struct Toggle(Arc<dyn Fn(SkillId, bool) + Send + Sync>);

impl Toggle {
    pub fn new(f: impl Fn(SkillId, bool) + Send + Sync + 'static) -> Self {
        Toggle(Arc::new(f))
    }

    /// A handler that ignores toggles (viewer not signed in, tests).
    pub fn noop() -> Self {
        Toggle(Arc::new(|_, _| {}))
    }

    /// Invokes the underlying collaborator callback.
    pub fn invoke(&self, id: SkillId, checked: bool) {
        (self.0)(id, checked);
    }
}

impl fmt::Debug for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Toggle(..)")
    }
}

impl PartialEq for Toggle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A renderable node. `id` is the stringified skill ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub skill_id: SkillId,
    pub is_root: bool,
    pub role: NodeRole,
    /// Present only on trackable nodes; `false` when the viewer has no
    /// progress record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_tree_id: Option<TreeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_stats: Option<LinkedStats>,
    pub style: NodeStyle,
    pub position: NodePosition,
    /// The toggle collaborator, passed through unmodified. Never
    /// serialized; wire consumers re-attach their own handler.
    #[serde(skip)]
    pub on_toggle: Option<Toggle>,
}

/// A renderable edge. The ID is derived from both endpoints
/// (`e{source}-{target}`) so re-transforms diff cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// The complete render model for one tree state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Width for a node rendering `label`: a floor wide enough for short
/// names, growing with the character count so long names do not overlap.
pub fn node_width(label: &str) -> f64 {
    let scaled = 80.0 + 9.0 * label.chars().count() as f64;
    scaled.max(220.0)
}

/// Transforms a tree into its laid out render model.
///
/// Pure with respect to its inputs except for `on_toggle`, which is
/// attached to every node untouched. `linked_stats` entries are optional
/// per linked tree; a missing entry leaves the node without counts.
pub fn to_graph(
    tree: &SkillTree,
    mode: ColorMode,
    editing: bool,
    progress: Option<&UserProgress>,
    on_toggle: &Toggle,
    linked_stats: &HashMap<TreeId, LinkedStats>,
) -> RenderGraph {
    let layout_nodes: Vec<LayoutNode> = tree
        .skills
        .iter()
        .map(|s| LayoutNode {
            id: s.id.to_string(),
            width: node_width(&s.name),
            height: NODE_HEIGHT,
        })
        .collect();

    let edges: Vec<GraphEdge> = tree
        .unlock_edges()
        .map(|(source, target)| GraphEdge {
            id: format!("e{source}-{target}"),
            source: source.to_string(),
            target: target.to_string(),
        })
        .collect();

    let layout_edges: Vec<LayoutEdge> = edges
        .iter()
        .map(|e| LayoutEdge {
            source: e.source.clone(),
            target: e.target.clone(),
        })
        .collect();

    let positions = layout(&layout_nodes, &layout_edges);

    let nodes = tree
        .skills
        .iter()
        .map(|skill| {
            let role = if skill.linked_tree_id.is_some() {
                NodeRole::Linked
            } else if editing {
                NodeRole::Structural
            } else {
                NodeRole::Trackable
            };
            let checked = match role {
                NodeRole::Trackable => {
                    Some(progress.is_some_and(|p| p.contains(skill.id)))
                }
                _ => None,
            };
            let linked_stats = skill
                .linked_tree_id
                .and_then(|id| linked_stats.get(&id))
                .copied();
            let id = skill.id.to_string();
            let position = positions.get(&id).copied().unwrap_or(NodePosition {
                x: 0.0,
                y: 0.0,
                width: node_width(&skill.name),
                height: NODE_HEIGHT,
            });
            GraphNode {
                id,
                label: skill.name.clone(),
                skill_id: skill.id,
                is_root: skill.is_root,
                role,
                checked,
                linked_tree_id: skill.linked_tree_id,
                linked_stats,
                style: NodeStyle::for_node(skill.is_root, skill.linked_tree_id.is_some(), mode),
                position,
                on_toggle: Some(on_toggle.clone()),
            }
        })
        .collect();

    RenderGraph { nodes, edges }
}
