//! # penguin-graph
//!
//! Mission and cron dependency graphs for EV Nova scenario data.
//!
//! The graph answers one question:
//!
//! > Which missions and crons read or write each global bit, and which
//! > missions start or abort which others?
//!
//! ## Core Contract
//!
//! 1. Decode each `misn`/`cron` record from an EVNEW text export
//! 2. Parse every expression field into `{set, clear}` clusters, mirrored onto the bits they name
//! 3. Optionally prune: reset-cron bits, dead missions, topologically equal missions
//! 4. Emit the live graph as GraphViz DOT or fingerprinted JSON
//!
//! ## Architecture
//!
//! ```text
//! export line → RecordDecoder → GraphBuilder → normalize(PruneMode) → render_dot / GraphExport
//!                                    ↓               ↓
//!                            ExpressionParser     Registry (bits, missions, crons)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same input + same mode → identical DOT text and JSON fingerprint
//! - Nodes are emitted by kind then ascending id
//! - Edges follow record, field and term order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod store;
pub mod config;
pub mod parser;
pub mod builder;
pub mod normalize;
pub mod export;
pub mod record;
pub mod canonical;
pub mod pipeline;

// Re-exports
pub use types::{
    Bit, Cluster, Cron, CronField, ExpressionRecord, Mission, MissionField, Phase, Polarity, Term,
    TermList, TermListError,
};
pub use store::{Arena, Registry, StoreError};
pub use config::{ConfigError, IdRange, PipelineConfig, PruneMode, CONFIG_ENV_VAR};
pub use parser::{ExpressionParser, ParseError, ParseLimits, ParseOutcome, ParsedExpression};
pub use builder::{BuildError, BuildStats, GraphBuilder};
pub use normalize::{
    compare_topology, cull_cron_reset_bits, cull_dead_missions, merge_equivalent_missions, normalize,
    NormalizeReport,
};
pub use export::{collect_edges, render_dot, EdgeKind, ExportError, GraphEdge, GraphExport, NodeRef};
pub use record::{Record, RecordDecoder, RecordError};
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};
pub use pipeline::{IngestStats, Pipeline, PipelineError};

/// Schema version for [`GraphExport`].
/// Increment on breaking changes to the JSON shape.
pub const GRAPH_EXPORT_SCHEMA_VERSION: &str = "1.0.0";
