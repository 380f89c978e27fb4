//! Local raster cache
//!
//! [`RasterCache`] is the only component that touches the cache directory.
//! A raster, once present, is treated as final: it is never re-fetched or
//! re-validated.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tokio::fs;
use tracing::{debug, error, info};

use crate::app::models::ArchiveKey;
use crate::app::raster::RasterGrid;
use crate::constants::files;
use crate::errors::{CacheError, CacheResult};

use super::archive::{ArchiveExtractor, ArchiveStatus};
use super::config::CacheConfig;
use super::path::PathGenerator;

/// Flat-directory store of hourly rasters and daily archives
#[derive(Debug)]
pub struct RasterCache {
    config: CacheConfig,
    cache_root: PathBuf,
}

impl RasterCache {
    /// Create a cache, creating its directory if needed
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::DirectoryNotAccessible`] if the directory cannot
    /// be resolved or created.
    pub async fn new(config: CacheConfig) -> CacheResult<Self> {
        let cache_root = match &config.cache_root {
            Some(path) => path.clone(),
            None => Self::get_default_cache_dir()?,
        };

        Self::ensure_directory_exists(&cache_root).await?;

        info!("Initialized raster cache at {}", cache_root.display());

        Ok(Self { config, cache_root })
    }

    /// Get the cache root directory
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Default cache directory, next to the configuration file
    ///
    /// - macOS: ~/Library/Application Support/imgw-raingrs/cache
    /// - Linux: ~/.config/imgw-raingrs/cache
    /// - Windows: %APPDATA%/imgw-raingrs/cache
    pub fn get_default_cache_dir() -> CacheResult<PathBuf> {
        let cache_dir = dirs::config_dir()
            .ok_or_else(|| CacheError::DirectoryNotAccessible {
                path: PathBuf::from("system config directory"),
            })?
            .join(files::APP_DIR_NAME)
            .join("cache");

        Ok(cache_dir)
    }

    async fn ensure_directory_exists(path: &Path) -> CacheResult<()> {
        match fs::metadata(path).await {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(CacheError::DirectoryNotAccessible {
                path: path.to_path_buf(),
            }),
            Err(_) => {
                fs::create_dir_all(path).await.map_err(|e| {
                    error!("Failed to create cache directory: {}", e);
                    CacheError::DirectoryNotAccessible {
                        path: path.to_path_buf(),
                    }
                })?;
                debug!("Created cache directory: {}", path.display());
                Ok(())
            }
        }
    }

    /// Deterministic local path of the raster for an hour
    pub fn raster_path(&self, timestamp: &NaiveDateTime) -> PathBuf {
        PathGenerator::raster_path(&self.cache_root, timestamp)
    }

    /// Local path of a daily archive
    pub fn archive_path(&self, key: &ArchiveKey) -> PathBuf {
        PathGenerator::archive_path(&self.cache_root, key)
    }

    /// True iff the raster for `timestamp` is present
    pub async fn exists(&self, timestamp: &NaiveDateTime) -> bool {
        fs::try_exists(self.raster_path(timestamp))
            .await
            .unwrap_or(false)
    }

    /// Persist raw raster bytes for an hour, overwriting any previous file
    pub async fn write(&self, timestamp: &NaiveDateTime, content: &[u8]) -> CacheResult<PathBuf> {
        let path = self.raster_path(timestamp);
        self.write_atomic(&path, content).await?;
        debug!("Cached raster for {} at {}", timestamp, path.display());
        Ok(path)
    }

    /// Persist a fetched daily archive into the cache directory
    pub async fn write_archive(&self, key: &ArchiveKey, content: &[u8]) -> CacheResult<PathBuf> {
        let path = self.archive_path(key);
        self.write_atomic(&path, content).await?;
        debug!("Saved archive {} ({} bytes)", path.display(), content.len());
        Ok(path)
    }

    async fn write_atomic(&self, final_path: &Path, content: &[u8]) -> CacheResult<()> {
        let io_error = |source: std::io::Error| CacheError::Io {
            path: final_path.to_path_buf(),
            source,
        };

        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let temp_path = PathGenerator::temp_path(final_path);
        if let Err(e) = fs::write(&temp_path, content).await {
            error!("Failed to write temporary file {}: {}", temp_path.display(), e);
            let _ = fs::remove_file(&temp_path).await;
            return Err(io_error(e));
        }

        fs::rename(&temp_path, final_path).await.map_err(|e| {
            error!("Failed to rename temporary file: {}", e);
            io_error(e)
        })
    }

    /// Read and decode the raster for an hour
    ///
    /// # Errors
    ///
    /// - [`CacheError::RasterNotFound`] if no raster is cached for the hour
    /// - [`CacheError::MalformedRaster`] if the file does not decode
    /// - [`CacheError::Io`] on read failures
    pub async fn read(&self, timestamp: &NaiveDateTime) -> CacheResult<RasterGrid> {
        let path = self.raster_path(timestamp);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::RasterNotFound {
                    timestamp: *timestamp,
                    path,
                });
            }
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        let parse_path = path.clone();
        tokio::task::spawn_blocking(move || RasterGrid::parse(&content))
            .await?
            .map_err(|source| CacheError::MalformedRaster {
                path: parse_path,
                source,
            })
    }

    /// Unpack an archive into `destination`
    ///
    /// A missing archive path is logged and reported as
    /// [`ArchiveStatus::Missing`] rather than failing.
    pub async fn extract_archive(
        &self,
        archive_path: &Path,
        destination: &Path,
    ) -> CacheResult<ArchiveStatus> {
        let archive = archive_path.to_path_buf();
        let target = destination.to_path_buf();
        let status =
            tokio::task::spawn_blocking(move || ArchiveExtractor::extract(&archive, &target))
                .await??;

        if let ArchiveStatus::Extracted { files } = status {
            info!("Extracted {} files from {}", files, archive_path.display());
            if !self.config.keep_archives {
                if let Err(e) = fs::remove_file(archive_path).await {
                    error!("Failed to remove extracted archive: {}", e);
                }
            }
        }

        Ok(status)
    }

    /// Unpack an archive into the cache directory itself
    pub async fn extract_archive_in_place(&self, archive_path: &Path) -> CacheResult<ArchiveStatus> {
        self.extract_archive(archive_path, &self.cache_root).await
    }
}
