//! Edge and node model for the emitted graph.
//!
//! The emitter is a read-only walk over a registry. It produces one edge per
//! `(record, field, polarity, target)` term and never follows an id whose
//! slot is not live.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::store::Registry;
use crate::types::{ExpressionRecord, Phase, Polarity, TermListError};

/// Reference to a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum NodeRef {
    /// A bit.
    Bit(i32),
    /// A mission.
    Mission(i32),
    /// A cron.
    Cron(i32),
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bit(id) => write!(f, "bit{id}"),
            Self::Mission(id) => write!(f, "misn{id}"),
            Self::Cron(id) => write!(f, "cron{id}"),
        }
    }
}

/// What an edge connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Record reads or writes a bit.
    Bit,
    /// Record starts or aborts a mission.
    Trigger,
}

/// Directed edge in the mission graph.
///
/// Test fields point bit → record; every other field points from the
/// record's field port to its target.
/// Implements `Ord` for deterministic ordering: (source, target, phase, polarity, kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GraphEdge {
    /// Tail node.
    pub source: NodeRef,
    /// Head node.
    pub target: NodeRef,
    /// Field the term came from.
    pub phase: Phase,
    /// Set or clear.
    pub polarity: Polarity,
    /// Bit or trigger edge.
    pub kind: EdgeKind,
}

impl GraphEdge {
    /// The mission or cron whose field produced this edge.
    pub fn record(&self) -> NodeRef {
        if self.phase.is_test() {
            self.target
        } else {
            self.source
        }
    }

    /// Port on the source node, if any.
    pub fn source_port(&self) -> Option<&'static str> {
        (!self.phase.is_test()).then(|| self.phase.name())
    }
}

/// Labelled node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    /// Node reference.
    pub node: NodeRef,
    /// Display label (unescaped).
    pub label: String,
}

/// Every live node: bits, then missions, then crons, ids ascending.
pub fn collect_nodes(registry: &Registry) -> Vec<GraphNode> {
    let bits = registry.bits.iter().map(|(id, _)| GraphNode { node: NodeRef::Bit(id), label: id.to_string() });
    let missions = registry
        .missions
        .iter()
        .map(|(id, m)| GraphNode { node: NodeRef::Mission(id), label: m.display_name() });
    let crons = registry
        .crons
        .iter()
        .map(|(id, c)| GraphNode { node: NodeRef::Cron(id), label: c.name.clone() });
    bits.chain(missions).chain(crons).collect()
}

/// Every edge from live records to live targets, grouped by record in
/// node order, then field order, set before clear, bits before triggers.
pub fn collect_edges(registry: &Registry) -> Result<Vec<GraphEdge>, TermListError> {
    let mut edges = Vec::new();
    for (id, mission) in registry.missions.iter() {
        record_edges(registry, NodeRef::Mission(id), mission, &mut edges)?;
    }
    for (id, cron) in registry.crons.iter() {
        record_edges(registry, NodeRef::Cron(id), cron, &mut edges)?;
    }
    Ok(edges)
}

fn record_edges<R: ExpressionRecord>(
    registry: &Registry,
    node: NodeRef,
    record: &R,
    out: &mut Vec<GraphEdge>,
) -> Result<(), TermListError> {
    for &field in R::FIELDS {
        let phase = R::phase(field);
        for polarity in [Polarity::Set, Polarity::Clear] {
            for bit in record.bits(field).side(polarity).iterate()? {
                if !registry.bit_is_used(bit) {
                    debug!(%node, bit, "skipping edge to culled bit");
                    continue;
                }
                let (source, target) = if phase.is_test() { (NodeRef::Bit(bit), node) } else { (node, NodeRef::Bit(bit)) };
                out.push(GraphEdge { source, target, phase, polarity, kind: EdgeKind::Bit });
            }
        }
        let Some(triggers) = record.triggers(field) else {
            continue;
        };
        for polarity in [Polarity::Set, Polarity::Clear] {
            for mission in triggers.side(polarity).iterate()? {
                if !registry.mission_is_used(mission) {
                    debug!(%node, mission, "skipping edge to dead mission");
                    continue;
                }
                out.push(GraphEdge {
                    source: node,
                    target: NodeRef::Mission(mission),
                    phase,
                    polarity,
                    kind: EdgeKind::Trigger,
                });
            }
        }
    }
    Ok(())
}
