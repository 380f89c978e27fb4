//! Library entry point
//!
//! [`RainGrs`] wires the cache, the upstream client, the projector and the
//! sampling strategy together and exposes the three top-level operations.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::info;

use crate::app::acquisition::AcquisitionPipeline;
use crate::app::cache::RasterCache;
use crate::app::client::{ImgwClient, SourceFetcher};
use crate::app::extraction::{ExtractionConfig, NearestCell, SeriesExtractor, SeriesOutput};
use crate::app::grid::{GridConfig, GridResolver};
use crate::app::models::{AcquisitionRecord, GeoPoint, TimeRange};
use crate::app::projection::{Cs92Projector, Projector};
use crate::config::RuntimeConfig;
use crate::errors::Result;

/// Outcome of [`RainGrs::fetch_series`]
#[derive(Debug)]
pub struct SeriesReport {
    pub record: AcquisitionRecord,
    pub series: SeriesOutput,
}

/// Hourly RainGRS acquisition and point extraction
pub struct RainGrs {
    cache: Arc<RasterCache>,
    pipeline: AcquisitionPipeline,
    extractor: SeriesExtractor,
}

impl RainGrs {
    /// Build every component from runtime configuration
    ///
    /// # Errors
    ///
    /// Fails if the cache directory cannot be prepared, the HTTP client
    /// cannot be built or the projection definitions are rejected.
    pub async fn new(config: &RuntimeConfig) -> Result<Self> {
        let cache = Arc::new(RasterCache::new(config.cache.clone()).await?);
        let client = Arc::new(ImgwClient::with_config(
            config.client.clone(),
            config.source.clone(),
        )?);
        let projector = Arc::new(Cs92Projector::new()?);

        Ok(Self::with_components(
            cache,
            client,
            projector,
            config.grid,
            config.extraction.clone(),
        ))
    }

    /// Assemble from explicit components
    pub fn with_components(
        cache: Arc<RasterCache>,
        fetcher: Arc<dyn SourceFetcher>,
        projector: Arc<dyn Projector>,
        grid: GridConfig,
        extraction: ExtractionConfig,
    ) -> Self {
        let pipeline = AcquisitionPipeline::new(fetcher, cache.clone());
        let strategy = Box::new(NearestCell::new(GridResolver::new(grid)));
        let extractor = SeriesExtractor::new(cache.clone(), projector, strategy, extraction);

        Self {
            cache,
            pipeline,
            extractor,
        }
    }

    pub fn cache(&self) -> &Arc<RasterCache> {
        &self.cache
    }

    /// Ensure every hourly raster of `range` is present locally where possible
    pub async fn acquire(&self, range: &TimeRange) -> AcquisitionRecord {
        self.pipeline.acquire(range).await
    }

    /// [`acquire`](Self::acquire) with a per-hour callback
    pub async fn acquire_with<F>(&self, range: &TimeRange, on_hour: F) -> AcquisitionRecord
    where
        F: FnMut(&NaiveDateTime, bool),
    {
        self.pipeline.acquire_with(range, on_hour).await
    }

    /// Extract point series from rasters already in the cache
    pub async fn extract_series(&self, range: &TimeRange, points: &[GeoPoint]) -> SeriesOutput {
        self.extractor.extract_series(range, points).await
    }

    /// Acquire the range, then extract the series
    pub async fn fetch_series(&self, range: &TimeRange, points: &[GeoPoint]) -> SeriesReport {
        let record = self.acquire(range).await;
        if !record.is_complete() {
            info!(
                "{} of {} hours unavailable, their rows will be missing",
                record.unavailable().len(),
                record.len()
            );
        }
        let series = self.extract_series(range, points).await;
        SeriesReport { record, series }
    }
}
