//! End-to-end pipeline: decode → build → normalize → emit.
//!
//! A [`Pipeline`] owns the registry for one run. Records are ingested until
//! [`Pipeline::normalize`] seals it; after that only the emitters may be
//! called.

use std::io::{BufRead, Write};

use serde::Serialize;
use tracing::{debug, warn};

use crate::builder::{BuildError, BuildStats, GraphBuilder};
use crate::config::{ConfigError, PipelineConfig, PruneMode};
use crate::export::{render_dot, ExportError, GraphExport};
use crate::normalize::{normalize, NormalizeReport};
use crate::parser::{ExpressionParser, ParseLimits};
use crate::record::{Record, RecordDecoder};
use crate::store::Registry;
use crate::types::TermListError;

/// Error type for a pipeline run. Every variant halts the run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A term list could not grow or was walked reentrantly.
    #[error("Term storage failed: {0}")]
    Capacity(#[from] TermListError),
    /// Reading input failed.
    #[error("Input error: {0}")]
    Io(#[from] std::io::Error),
    /// Config was invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    /// Records were offered after normalization.
    #[error("Pipeline already normalized")]
    Sealed,
    /// Writing output failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Ingest counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Lines read, blank lines included.
    pub lines: usize,
    /// Records registered.
    pub records: usize,
    /// Lines or records discarded.
    pub rejected: usize,
    /// Expression-level counters.
    pub build: BuildStats,
}

/// One run over one export.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    registry: Registry,
    decoder: RecordDecoder,
    parser: ExpressionParser,
    stats: IngestStats,
    report: Option<NormalizeReport>,
}

impl Pipeline {
    /// Create an empty pipeline after validating `config`.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            registry: Registry::new(&config),
            decoder: RecordDecoder::new(&config),
            parser: ExpressionParser::new(ParseLimits::from(&config)),
            config,
            stats: IngestStats::default(),
            report: None,
        })
    }

    /// Config this run uses.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Registry built so far.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Ingest counters so far.
    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Normalization report, once normalized.
    pub fn report(&self) -> Option<&NormalizeReport> {
        self.report.as_ref()
    }

    /// Decode and ingest one export line. Undecodable lines are logged and skipped.
    pub fn ingest_line(&mut self, line: &str) -> Result<(), PipelineError> {
        self.check_open()?;
        self.stats.lines += 1;
        match self.decoder.decode(line) {
            Ok(Some(record)) => self.ingest_record(record),
            Ok(None) => Ok(()),
            Err(e) => {
                warn!(line = self.stats.lines, error = %e, "record discarded");
                self.stats.rejected += 1;
                Ok(())
            }
        }
    }

    /// Ingest every line of `reader`. Invalid UTF-8 is replaced, not rejected.
    pub fn ingest_reader<R: BufRead>(&mut self, mut reader: R) -> Result<IngestStats, PipelineError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            self.ingest_line(&line)?;
        }
        Ok(self.stats)
    }

    /// Register an already decoded record.
    pub fn ingest_record(&mut self, record: Record) -> Result<(), PipelineError> {
        self.check_open()?;
        let (kind, id) = (record.kind(), record.id());
        let mut builder = GraphBuilder::new(&mut self.registry, self.parser);
        let built = match record {
            Record::Mission(m) => builder.add_mission(m),
            Record::Cron(c) => builder.add_cron(c),
        };
        match built {
            Ok(stats) => {
                debug!(kind, id, terms = stats.terms, "record ingested");
                self.stats.records += 1;
                self.stats.build.absorb(stats);
                Ok(())
            }
            Err(BuildError::Rejected(e)) => {
                warn!(kind, id, error = %e, "record rejected");
                self.stats.rejected += 1;
                Ok(())
            }
            Err(BuildError::Capacity(e)) => Err(PipelineError::Capacity(e)),
        }
    }

    /// Run the passes `mode` selects and seal the pipeline.
    pub fn normalize(&mut self, mode: PruneMode) -> Result<&NormalizeReport, PipelineError> {
        self.check_open()?;
        let report = normalize(&mut self.registry, mode, self.config.cull_floor)?;
        Ok(self.report.insert(report))
    }

    /// Render the live graph as DOT.
    pub fn write_dot<W: Write>(&self, out: &mut W) -> Result<(), PipelineError> {
        render_dot(&self.registry, out)?;
        Ok(())
    }

    /// Snapshot the live graph for JSON output.
    pub fn export_json(&self) -> Result<GraphExport, PipelineError> {
        Ok(GraphExport::from_registry(&self.registry)?)
    }

    fn check_open(&self) -> Result<(), PipelineError> {
        if self.report.is_some() {
            Err(PipelineError::Sealed)
        } else {
            Ok(())
        }
    }
}
