//! GraphViz DOT rendering.
//!
//! Layout: bits as plain dotted nodes, missions as `Mrecord` nodes with one
//! port per write field, crons as `record` nodes with start/end ports. Each
//! record is followed by its own edges.

use std::collections::BTreeMap;
use std::io::Write;

use crate::store::Registry;
use crate::types::Polarity;

use super::edge::{collect_edges, collect_nodes, EdgeKind, GraphEdge, GraphNode, NodeRef};
use super::ExportError;

const BIT_STYLE: &str = r##"node [shape=plain style=dotted fillcolor="#11EE115f"];"##;
const MISSION_STYLE: &str = r##"node [shape=Mrecord style=filled fillcolor="#1111EE5f"];"##;
const CRON_STYLE: &str = r##"node [shape=record style=filled fillcolor="#EE11115f"];"##;

const MISSION_PORTS: &str = "{<accept>accept|<refuse>refuse}|<ship>ship|{<success>success|<failure>failure|<abort>abort}";
const CRON_PORTS: &str = "{<start>start|<end>end}";

/// Replace characters GraphViz treats as record syntax.
pub fn escape_label(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' => '[',
            '>' => ']',
            '{' => '(',
            '}' => ')',
            '|' => '/',
            '"' => '\'',
            '\\' => '/',
            other => other,
        })
        .collect()
}

/// Attribute suffix for an edge, including the terminating `;`.
fn edge_style(edge: &GraphEdge) -> &'static str {
    match (edge.kind, edge.polarity) {
        (EdgeKind::Bit, Polarity::Set) => ";",
        (EdgeKind::Bit, Polarity::Clear) => " [color=red arrowhead=empty style=dashed];",
        (EdgeKind::Trigger, Polarity::Set) => " [color=green];",
        (EdgeKind::Trigger, Polarity::Clear) => " [color=green arrowhead=empty style=dashed];",
    }
}

fn write_edge<W: Write>(out: &mut W, edge: &GraphEdge) -> std::io::Result<()> {
    match edge.source_port() {
        Some(port) => write!(out, "{}:{} -> {}", edge.source, port, edge.target)?,
        None => write!(out, "{} -> {}", edge.source, edge.target)?,
    }
    writeln!(out, "{}", edge_style(edge))
}

fn write_records<W: Write>(
    out: &mut W,
    nodes: &[GraphNode],
    by_record: &BTreeMap<NodeRef, Vec<&GraphEdge>>,
    style: &str,
    ports: &str,
    is_kind: impl Fn(&NodeRef) -> bool,
) -> std::io::Result<()> {
    writeln!(out, "{style}")?;
    for node in nodes.iter().filter(|n| is_kind(&n.node)) {
        let (NodeRef::Bit(id) | NodeRef::Mission(id) | NodeRef::Cron(id)) = node.node;
        writeln!(out, "{} [label=\"{}: {}|{}\"];", node.node, id, escape_label(&node.label), ports)?;
        for edge in by_record.get(&node.node).into_iter().flatten() {
            write_edge(out, edge)?;
        }
    }
    writeln!(out)
}

/// Write the live graph of `registry` as a DOT digraph.
pub fn render_dot<W: Write>(registry: &Registry, out: &mut W) -> Result<(), ExportError> {
    let nodes = collect_nodes(registry);
    let edges = collect_edges(registry)?;
    let mut by_record: BTreeMap<NodeRef, Vec<&GraphEdge>> = BTreeMap::new();
    for edge in &edges {
        by_record.entry(edge.record()).or_default().push(edge);
    }

    writeln!(out, "digraph misn {{")?;
    writeln!(out)?;

    writeln!(out, "{BIT_STYLE}")?;
    for node in nodes.iter().filter(|n| matches!(n.node, NodeRef::Bit(_))) {
        writeln!(out, "{} [label=\"{}\"];", node.node, node.label)?;
    }
    writeln!(out)?;

    write_records(out, &nodes, &by_record, MISSION_STYLE, MISSION_PORTS, |n| matches!(n, NodeRef::Mission(_)))?;
    write_records(out, &nodes, &by_record, CRON_STYLE, CRON_PORTS, |n| matches!(n, NodeRef::Cron(_)))?;

    writeln!(out, "}}")?;
    Ok(())
}
