//! Local raster cache
//!
//! All rasters and fetched archives live flat in one cache directory.
//! Archives are extracted in place so that the rasters they carry sit next to
//! those written from the live source.
//!
//! # Module Organization
//!
//! - [`config`] - Configuration types and defaults
//! - [`path`] - Deterministic file naming within the cache root
//! - [`archive`] - Tar extraction
//! - [`manager`] - The [`RasterCache`] itself
//!
//! # Examples
//!
//! ```rust,no_run
//! use imgw_raingrs::app::cache::{CacheConfig, RasterCache};
//! use imgw_raingrs::app::models::parse_timestamp;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = RasterCache::new(CacheConfig::with_cache_root(PathBuf::from("grs_asc"))).await?;
//! let hour = parse_timestamp("2024-07-20T15:00")?;
//!
//! if cache.exists(&hour).await {
//!     let grid = cache.read(&hour).await?;
//!     println!("{} x {} cells", grid.nrows(), grid.ncols());
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod config;
pub mod manager;
pub mod path;

// Re-export main public API
pub use archive::ArchiveStatus;
pub use config::CacheConfig;
pub use manager::RasterCache;
pub use path::PathGenerator;
