//! Engine configuration

use octofhir_cohort_types::{CATEGORICAL_THRESHOLD, DATE_THRESHOLD, DEFAULT_SAMPLE_ROWS, TypeInferencer};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default number of rows evaluated per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default lifetime of a cached comparison, in seconds
pub const DEFAULT_COMPARISON_TTL_SECS: u64 = 3600;

/// Configuration load error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Tunables for building and comparing cohorts
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rows evaluated between cancellation/deadline checks
    pub chunk_size: usize,
    /// Evaluate chunks on the rayon pool
    pub parallel: bool,
    /// Wall-clock budget for one build or comparison
    pub deadline_ms: Option<u64>,
    /// Lifetime of cached comparison results
    pub comparison_ttl_secs: u64,
    /// Leading rows kept as a dataset preview
    pub sample_rows: usize,
    pub categorical_threshold: f64,
    pub date_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            parallel: false,
            deadline_ms: None,
            comparison_ttl_secs: DEFAULT_COMPARISON_TTL_SECS,
            sample_rows: DEFAULT_SAMPLE_ROWS,
            categorical_threshold: CATEGORICAL_THRESHOLD,
            date_threshold: DATE_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be positive".to_string()));
        }
        for (name, value) in [
            ("categorical_threshold", self.categorical_threshold),
            ("date_threshold", self.date_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{} must be within 0..=1, got {}", name, value)));
            }
        }
        Ok(())
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_deadline_ms(mut self, deadline_ms: Option<u64>) -> Self {
        self.deadline_ms = deadline_ms;
        self
    }

    pub fn with_comparison_ttl_secs(mut self, secs: u64) -> Self {
        self.comparison_ttl_secs = secs;
        self
    }

    /// Type inferencer using the configured thresholds
    pub fn inferencer(&self) -> TypeInferencer {
        TypeInferencer::with_thresholds(self.categorical_threshold, self.date_threshold)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    pub fn comparison_ttl(&self) -> chrono::Duration {
        i64::try_from(self.comparison_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}
