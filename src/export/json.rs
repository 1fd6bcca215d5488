//! JSON export of the live graph with a canonical fingerprint.

use std::io::Write;

use serde::Serialize;

use crate::canonical::canonical_hash_hex;
use crate::store::Registry;
use crate::GRAPH_EXPORT_SCHEMA_VERSION;

use super::edge::{collect_edges, collect_nodes, GraphEdge, GraphNode};
use super::ExportError;

/// Serializable snapshot of the live graph.
///
/// `fingerprint` is the xxh64 of the canonical JSON of `(nodes, edges)`, so
/// two runs over the same input produce the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphExport {
    /// Export format version.
    pub schema_version: String,
    /// Live nodes in kind then id order.
    pub nodes: Vec<GraphNode>,
    /// Live edges, grouped by record.
    pub edges: Vec<GraphEdge>,
    /// Hex fingerprint of nodes and edges.
    pub fingerprint: String,
}

impl GraphExport {
    /// Snapshot `registry`.
    pub fn from_registry(registry: &Registry) -> Result<Self, ExportError> {
        let nodes = collect_nodes(registry);
        let edges = collect_edges(registry)?;
        let fingerprint = canonical_hash_hex(&(&nodes, &edges))?;
        Ok(Self { schema_version: GRAPH_EXPORT_SCHEMA_VERSION.to_string(), nodes, edges, fingerprint })
    }

    /// Write as pretty JSON followed by a newline.
    pub fn write_json<W: Write>(&self, out: &mut W) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::parser::ExpressionParser;
    use crate::types::Mission;

    fn registry(expr: &str) -> Registry {
        let mut registry = Registry::default();
        let mut m = Mission::new(200, "Courier");
        m.on_success = expr.to_string();
        GraphBuilder::new(&mut registry, ExpressionParser::default()).add_mission(m).unwrap();
        registry
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = GraphExport::from_registry(&registry("b1 !b2")).unwrap();
        let b = GraphExport::from_registry(&registry("b1 !b2")).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.fingerprint.len(), 16);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = GraphExport::from_registry(&registry("b1 !b2")).unwrap();
        let b = GraphExport::from_registry(&registry("b1 b2")).unwrap();
        assert_ne!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_json_shape() {
        let export = GraphExport::from_registry(&registry("!b3")).unwrap();
        let mut buf = Vec::new();
        export.write_json(&mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["schema_version"], GRAPH_EXPORT_SCHEMA_VERSION);
        assert_eq!(value["nodes"][0]["node"]["kind"], "bit");
        assert_eq!(value["nodes"][1]["label"], "Courier");
        let edge = &value["edges"][0];
        assert_eq!(edge["source"]["id"], 200);
        assert_eq!(edge["polarity"], "clear");
        assert_eq!(edge["kind"], "bit");
        assert_eq!(edge["phase"]["mission"], "success");
    }
}
