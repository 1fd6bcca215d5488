//! Pipeline configuration.
//!
//! Every field has a default matching the EV Nova limits, so an empty JSON
//! object is a valid config. A file named by `PENGUIN_CONFIG` overrides the
//! defaults field by field.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "PENGUIN_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("Cannot read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// File is not valid config JSON.
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Values are inconsistent.
    #[error("Invalid config: {0}")]
    Invalid(String),
    /// Unknown prune mode.
    #[error("Unknown mode '{0}', expected one of all, some, strict")]
    UnknownMode(String),
}

/// Half-open id range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdRange {
    /// First valid id.
    pub start: i32,
    /// One past the last valid id; also the arena size.
    pub end: i32,
}

impl IdRange {
    /// Create a new range.
    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// True if `id` lies in the range.
    pub fn contains(&self, id: i64) -> bool {
        id >= self.start as i64 && id < self.end as i64
    }

    /// True if the range holds no ids.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// How aggressively to prune the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PruneMode {
    /// No pruning.
    All,
    /// Cron-pattern bit culling and dead-mission culling.
    Some,
    /// Everything in `Some`, then merge equivalent missions.
    Strict,
}

impl PruneMode {
    /// Run the cron-pattern and dead-mission passes.
    pub fn culls(&self) -> bool {
        matches!(self, Self::Some | Self::Strict)
    }

    /// Run the merge pass.
    pub fn merges(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

impl FromStr for PruneMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "some" => Ok(Self::Some),
            "strict" => Ok(Self::Strict),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for PruneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Some => write!(f, "some"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

/// Limits and thresholds for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of bit slots; bit ids are `[0, bit_capacity)`.
    pub bit_capacity: i32,
    /// Valid mission record ids.
    pub mission_ids: IdRange,
    /// Valid cron record ids.
    pub cron_ids: IdRange,
    /// Maximum parenthesis nesting in one expression.
    pub max_paren_depth: usize,
    /// Missions below this id are never culled as dead.
    ///
    /// The default is `mission_ids.start`, which reserves nothing: every
    /// valid mission is eligible. Raise it to protect entry-point missions.
    pub cull_floor: i32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bit_capacity: 100_001,
            mission_ids: IdRange::new(128, 1128),
            cron_ids: IdRange::new(128, 2048),
            max_paren_depth: 16,
            cull_floor: 128,
        }
    }
}

impl PipelineConfig {
    /// Load from the file named by `PENGUIN_CONFIG`, or defaults if unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Load and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate JSON config text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the ranges are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bit_capacity <= 0 {
            return Err(ConfigError::Invalid(format!("bit_capacity {} must be positive", self.bit_capacity)));
        }
        for (name, range) in [("mission_ids", self.mission_ids), ("cron_ids", self.cron_ids)] {
            if range.is_empty() || range.start < 1 {
                return Err(ConfigError::Invalid(format!("{name} {range} must be non-empty and exclude 0")));
            }
        }
        if self.cull_floor > self.mission_ids.end {
            return Err(ConfigError::Invalid(format!(
                "cull_floor {} is above mission_ids {}",
                self.cull_floor, self.mission_ids
            )));
        }
        if self.max_paren_depth == 0 {
            return Err(ConfigError::Invalid("max_paren_depth must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = PipelineConfig::from_json(r#"{"bit_capacity": 10000, "max_paren_depth": 4}"#).unwrap();
        assert_eq!(config.bit_capacity, 10000);
        assert_eq!(config.max_paren_depth, 4);
        assert_eq!(config.mission_ids, IdRange::new(128, 1128));
    }

    #[test]
    fn test_rejects_empty_range() {
        let err = PipelineConfig::from_json(r#"{"cron_ids": {"start": 10, "end": 10}}"#).unwrap_err();
        assert!(err.to_string().contains("cron_ids"));
    }

    #[test]
    fn test_rejects_zero_start() {
        assert!(PipelineConfig::from_json(r#"{"mission_ids": {"start": 0, "end": 10}}"#).is_err());
    }

    #[test]
    fn test_default_floor_reserves_nothing() {
        let config = PipelineConfig::default();
        assert_eq!(config.cull_floor, config.mission_ids.start);
        let raised = PipelineConfig::from_json(r#"{"cull_floor": 200}"#).unwrap();
        assert_eq!(raised.cull_floor, 200);
    }

    #[test]
    fn test_rejects_floor_above_missions() {
        let err = PipelineConfig::from_json(r#"{"cull_floor": 5000}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("strict".parse::<PruneMode>().unwrap(), PruneMode::Strict);
        assert!(PruneMode::Some.culls());
        assert!(!PruneMode::Some.merges());
        assert!(!PruneMode::All.culls());
        assert!(matches!("loose".parse::<PruneMode>(), Err(ConfigError::UnknownMode(_))));
    }

    #[test]
    fn test_range_contains() {
        let r = IdRange::new(128, 1128);
        assert!(r.contains(128));
        assert!(!r.contains(1128));
        assert!(!r.contains(-1));
        assert!(!r.contains(i64::MAX));
    }
}
