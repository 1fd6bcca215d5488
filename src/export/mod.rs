//! Graph emission: edge model, DOT rendering and JSON export.
//!
//! Emitters only read the registry. Every id they follow is checked against
//! the arena so tombstoned bits and missions never appear.

pub mod dot;
pub mod edge;
pub mod json;

pub use dot::{escape_label, render_dot};
pub use edge::{collect_edges, collect_nodes, EdgeKind, GraphEdge, GraphNode, NodeRef};
pub use json::GraphExport;

use crate::types::TermListError;

/// Error type for emission.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Writing output failed.
    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),
    /// A cluster was already being iterated.
    #[error("Cluster walk failed: {0}")]
    Walk(#[from] TermListError),
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
