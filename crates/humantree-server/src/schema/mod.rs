//! Request/response types for the HTTP API.

pub mod graph;
pub mod progress;
pub mod sessions;
pub mod trees;
