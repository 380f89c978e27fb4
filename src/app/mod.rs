//! Core application logic for the IMGW RainGRS fetcher
//!
//! This module contains the raster cache, the upstream client, the
//! acquisition pipeline with its archive fallback, and the point series
//! extraction built on the grid resolver and projector.
//!
//! # Examples
//!
//! ```rust,no_run
//! use imgw_raingrs::app::models::{parse_timestamp, GeoPoint, TimeRange};
//! use imgw_raingrs::app::RainGrs;
//! use imgw_raingrs::config::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load(None).await?;
//! let raingrs = RainGrs::new(&config.to_runtime_config()).await?;
//!
//! let range = TimeRange::new(
//!     parse_timestamp("2024-07-20T00:00")?,
//!     parse_timestamp("2024-07-20T23:00")?,
//! )?;
//! let points = vec![GeoPoint::new(51.413447, 21.965275).with_label("Pulawy")];
//!
//! let report = raingrs.fetch_series(&range, &points).await;
//! for row in &report.series.rows {
//!     println!("{} {:?}", row.timestamp, row.value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod acquisition;
pub mod cache;
pub mod client;
pub mod extraction;
pub mod grid;
pub mod models;
pub mod projection;
pub mod raingrs;
pub mod raster;

// Re-export main public API
pub use acquisition::{AcquisitionPipeline, AcquisitionState, ArchiveAttempt};
pub use cache::{ArchiveStatus, CacheConfig, RasterCache};
pub use client::{ClientConfig, FetchOutcome, ImgwClient, SourceConfig, SourceFetcher};
pub use extraction::{
    ExtractionConfig, FailureReport, MissingRasterPolicy, NearestCell, RowFailure,
    SamplingStrategy, SeriesExtractor, SeriesOutput,
};
pub use grid::{GridConfig, GridResolver};
pub use models::{
    AcquisitionRecord, AcquisitionStats, ArchiveKey, GeoPoint, GridCell, PlanarPoint,
    RasterSource, SeriesRow, TimeRange,
};
pub use projection::{Cs92Projector, Projector};
pub use raingrs::{RainGrs, SeriesReport};
pub use raster::{RasterGrid, RasterHeader};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        let config = ClientConfig::default();
        assert!(config.rate_limit_rps > 0);
        assert_eq!(GridResolver::default().config(), &GridConfig::default());
    }
}
