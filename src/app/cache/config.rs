//! Cache configuration types and defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the local raster cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding rasters and archives (OS-specific if None)
    pub cache_root: Option<PathBuf>,
    /// Keep downloaded archives next to the extracted rasters
    pub keep_archives: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_root: None, // Will use OS-specific config directory
            keep_archives: true,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with custom cache root
    pub fn with_cache_root(cache_root: PathBuf) -> Self {
        Self {
            cache_root: Some(cache_root),
            ..Default::default()
        }
    }

    /// Keep or delete archives once they have been extracted
    pub fn with_keep_archives(mut self, keep: bool) -> Self {
        self.keep_archives = keep;
        self
    }
}
