//! Cache file path generation
//!
//! Rasters and archives live flat in the cache root; archives are extracted
//! in place so their rasters land next to the live-source files.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::app::models::{raster_file_name, ArchiveKey};
use crate::constants::files;

/// Path generation utility for cache files
pub struct PathGenerator;

impl PathGenerator {
    /// `{cache_root}/{%Y%m%d%H%M}_acc0060_grs.asc`
    pub fn raster_path(cache_root: &Path, timestamp: &NaiveDateTime) -> PathBuf {
        cache_root.join(raster_file_name(timestamp))
    }

    /// `{cache_root}/grs_60_asc_{%Y-%m-%d}.tar`
    pub fn archive_path(cache_root: &Path, key: &ArchiveKey) -> PathBuf {
        cache_root.join(key.file_name())
    }

    /// Sibling temp path used for atomic writes
    pub fn temp_path(final_path: &Path) -> PathBuf {
        final_path.with_extension(format!(
            "{}{}",
            final_path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or(""),
            files::TEMP_FILE_SUFFIX
        ))
    }
}
