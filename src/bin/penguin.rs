//! Penguin command-line tool.
//!
//! Reads an EVNEW text export of misns and crons on stdin and writes the
//! mission dependency graph on stdout, as GraphViz DOT or, with `--json`, as
//! a fingerprinted JSON export.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `PENGUIN_CONFIG`: JSON file overriding the default limits
//! - `RUST_LOG`: Log level filter (default: penguin=info,penguin_graph=info)
//! - `LOG_FORMAT`: "json" for structured logs, anything else for text (default: text)
//!
//! ## Usage
//!
//! ```bash
//! penguin strict < novadata.tsv > allmisns.gv
//! dot allmisns.gv -O -Tpdf
//! ```

use std::io::{self, BufWriter, Write};

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use penguin_graph::{ConfigError, Pipeline, PipelineConfig, PruneMode};

const USAGE: &str = "\
Usage: penguin <mode> [--json] < novadata.tsv > allmisns.gv

Where <mode> is one of { all, some, strict }; all does not prune, some does
obvious pruning, and strict also merges missions with identical topology.

The input is misns and crons exported with EVNEW text 1.0.1; the output is a
GraphViz file (or JSON with --json). Then one could get a graph with

  dot (or fdp, etc) allmisns.gv -O -Tpdf
";

/// Initialize the tracing subscriber on stderr, JSON or text format.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "penguin=info,penguin_graph=info".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).flatten_event(true).with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .init();
    }
}

/// Parsed command line.
struct Args {
    mode: PruneMode,
    json: bool,
}

/// `Ok(None)` means print usage and exit cleanly.
fn parse_args(args: impl Iterator<Item = String>) -> Result<Option<Args>, ConfigError> {
    let mut mode = None;
    let mut json = false;
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--json" => json = true,
            other => mode = Some(other.parse::<PruneMode>()?),
        }
    }
    Ok(mode.map(|mode| Args { mode, json }))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            eprint!("{USAGE}");
            eprintln!("Version {}.", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Err(e) => {
            eprint!("{USAGE}");
            return Err(e.into());
        }
    };

    init_tracing();

    let config = PipelineConfig::from_env()?;
    info!(mode = %args.mode, json = args.json, bit_capacity = config.bit_capacity, "Starting penguin");

    let mut pipeline = Pipeline::new(config)?;
    let stats = pipeline.ingest_reader(io::stdin().lock())?;
    info!(
        lines = stats.lines,
        records = stats.records,
        rejected = stats.rejected,
        terms = stats.build.terms,
        failed_fields = stats.build.failed_fields,
        "Input read"
    );

    pipeline.normalize(args.mode)?;

    let mut out = BufWriter::new(io::stdout().lock());
    if args.json {
        pipeline.export_json()?.write_json(&mut out)?;
    } else {
        pipeline.write_dot(&mut out)?;
    }
    out.flush()?;

    let (bits, missions, crons) = pipeline.registry().live_counts();
    info!(bits, missions, crons, "Graph written");
    Ok(())
}
