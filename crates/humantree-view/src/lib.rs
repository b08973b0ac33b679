//! Render-model layer: turns a [`humantree_core::SkillTree`] into a laid
//! out graph the presentation layer can draw directly.
//!
//! The transform itself ([`graph::to_graph`]) is a pure function of its
//! inputs; re-running it replaces the previous graph wholesale. The
//! [`pipeline::RenderPipeline`] wraps it with a generation counter so
//! layout can run off the event loop without stale results ever being
//! applied.

pub mod graph;
pub mod pipeline;

pub use graph::{
    ColorMode, GraphEdge, GraphNode, LinkedStats, NodeRole, NodeStyle, RenderGraph, Toggle,
    to_graph,
};
pub use pipeline::{RenderPipeline, RenderRequest};
