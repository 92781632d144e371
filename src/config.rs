use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::path::Path;

/// Tunables accepted by every analysis. Missing keys in a config file fall
/// back to the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisOpts {
    /// Numeric fields with more distinct values than this get bucketed.
    pub bucket_threshold: usize,
    pub bucket_count: usize,
    /// Length cap of `topChanges` per field.
    pub top_changes: usize,
    /// Sample log lines kept per pattern.
    pub sample_cap: usize,
    /// distinct/observed ratio above which a field is treated as an identifier.
    pub unique_ratio: f64,
    /// Minimum documents carrying a field before the identifier rule applies.
    pub min_cardinality_sample: usize,
    /// Extra field names never analyzed, on top of the reserved ones.
    pub exclude_fields: Vec<String>,
}

impl Default for AnalysisOpts {
    fn default() -> Self {
        Self {
            bucket_threshold: 10,
            bucket_count: 5,
            top_changes: 5,
            sample_cap: 3,
            unique_ratio: 0.9,
            min_cardinality_sample: 2,
            exclude_fields: Vec::new(),
        }
    }
}

impl AnalysisOpts {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let opts: AnalysisOpts = serde_json::from_str(s)?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::InvalidOptions(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket_count == 0 {
            return Err(EngineError::InvalidOptions("bucket_count must be at least 1".into()));
        }
        if self.top_changes == 0 {
            return Err(EngineError::InvalidOptions("top_changes must be at least 1".into()));
        }
        if !(self.unique_ratio > 0.0 && self.unique_ratio <= 1.0) {
            return Err(EngineError::InvalidOptions(format!(
                "unique_ratio must be in (0, 1], got {}",
                self.unique_ratio
            )));
        }
        Ok(())
    }
}
