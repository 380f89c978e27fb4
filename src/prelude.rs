//! Prelude module for the IMGW RainGRS library
//!
//! Re-exports the items needed for typical usage with a single
//! `use imgw_raingrs::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use imgw_raingrs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let raingrs = RainGrs::new(&AppConfig::default().to_runtime_config()).await?;
//!     let range = TimeRange::single(parse_timestamp("2024-07-20T15:00")?)?;
//!     let record = raingrs.acquire(&range).await;
//!     println!("complete: {}", record.is_complete());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

pub use crate::app::models::parse_timestamp;
pub use crate::app::{
    AcquisitionRecord, CacheConfig, ClientConfig, ExtractionConfig, GeoPoint, GridCell,
    GridConfig, ImgwClient, MissingRasterPolicy, RainGrs, RasterCache, SeriesOutput,
    SeriesReport, SeriesRow, SourceConfig, SourceFetcher, TimeRange,
};
pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{BASE_URL, USER_AGENT};

pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;
