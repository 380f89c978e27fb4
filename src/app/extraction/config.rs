//! Extraction configuration types and defaults

use serde::{Deserialize, Serialize};

/// What to do for an hour whose raster is not in the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingRasterPolicy {
    /// Produce no rows for the hour
    #[default]
    Skip,
    /// Produce one row per point with a missing value
    EmitMissing,
}

/// Configuration for series extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub missing_raster: MissingRasterPolicy,
}

impl ExtractionConfig {
    pub fn with_missing_raster(mut self, policy: MissingRasterPolicy) -> Self {
        self.missing_raster = policy;
        self
    }
}
