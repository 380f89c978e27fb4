//! Hourly raster acquisition with source fallback
//!
//! For every hour of a [`TimeRange`] the pipeline makes sure the raster is
//! present in the [`RasterCache`], trying in turn the cache, the live source,
//! the archive published two days later and the archive published one day
//! later. Hours are processed strictly one after another.
//!
//! Nothing is raised to the caller: upstream failures and archives that
//! cannot be saved or extracted end in the next fallback step, and a live
//! raster that cannot be written ends the hour as unavailable. The outcome
//! is an [`AcquisitionRecord`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use imgw_raingrs::app::{AcquisitionPipeline, CacheConfig, ImgwClient, RasterCache};
//! use imgw_raingrs::app::models::{parse_timestamp, TimeRange};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Arc::new(RasterCache::new(CacheConfig::default()).await?);
//! let client = Arc::new(ImgwClient::new()?);
//! let pipeline = AcquisitionPipeline::new(client, cache);
//!
//! let range = TimeRange::new(
//!     parse_timestamp("2024-07-20T00:00")?,
//!     parse_timestamp("2024-07-20T23:00")?,
//! )?;
//! let record = pipeline.acquire(&range).await;
//! println!("{} of {} hours available", record.available_count(), record.len());
//! # Ok(())
//! # }
//! ```

pub mod state;


use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, error, info, warn};

use crate::app::cache::{ArchiveStatus, RasterCache};
use crate::app::client::{FetchOutcome, SourceFetcher};
use crate::app::models::{AcquisitionRecord, ArchiveKey, RasterSource, TimeRange};

pub use state::{AcquisitionState, ArchiveAttempt};

/// Drives every hour of a range through the fallback schedule
pub struct AcquisitionPipeline {
    fetcher: Arc<dyn SourceFetcher>,
    cache: Arc<RasterCache>,
}

impl AcquisitionPipeline {
    pub fn new(fetcher: Arc<dyn SourceFetcher>, cache: Arc<RasterCache>) -> Self {
        Self { fetcher, cache }
    }

    pub fn cache(&self) -> &Arc<RasterCache> {
        &self.cache
    }

    /// Make every hour of `range` available locally where possible
    pub async fn acquire(&self, range: &TimeRange) -> AcquisitionRecord {
        self.acquire_with(range, |_, _| {}).await
    }

    /// Like [`acquire`](Self::acquire), reporting each finished hour to
    /// `on_hour`
    pub async fn acquire_with<F>(&self, range: &TimeRange, mut on_hour: F) -> AcquisitionRecord
    where
        F: FnMut(&NaiveDateTime, bool),
    {
        info!("Acquiring {} hourly rasters for {}", range.len(), range);

        let mut record = AcquisitionRecord::new();
        for timestamp in range.hours() {
            let source = self.acquire_hour(&timestamp).await;
            match source {
                Some(source) => info!("{}: available ({:?})", timestamp, source),
                None => info!("{}: unavailable", timestamp),
            }
            record.record(timestamp, source);
            on_hour(&timestamp, source.is_some());
        }

        let stats = record.stats();
        info!(
            "Acquisition finished: {} cached, {} live, {} from +2d archive, {} from +1d archive, {} unavailable",
            stats.cached,
            stats.live,
            stats.archive_primary,
            stats.archive_fallback,
            stats.unavailable
        );
        record
    }

    /// Run the state machine for one hour to its terminal state
    pub async fn acquire_hour(&self, timestamp: &NaiveDateTime) -> Option<RasterSource> {
        let mut state = AcquisitionState::CheckCache;
        loop {
            if let AcquisitionState::Done(source) = state {
                return source;
            }
            let next = self.step(timestamp, state).await;
            debug!("{}: {} -> {}", timestamp, state, next);
            state = next;
        }
    }

    async fn step(&self, timestamp: &NaiveDateTime, state: AcquisitionState) -> AcquisitionState {
        match state {
            AcquisitionState::CheckCache => {
                if self.cache.exists(timestamp).await {
                    AcquisitionState::Done(Some(RasterSource::Cache))
                } else {
                    AcquisitionState::LiveFetch
                }
            }
            AcquisitionState::LiveFetch => self.fetch_live(timestamp).await,
            AcquisitionState::ArchiveFetch(attempt) => {
                self.fetch_archive(timestamp, attempt).await
            }
            done @ AcquisitionState::Done(_) => done,
        }
    }

    async fn fetch_live(&self, timestamp: &NaiveDateTime) -> AcquisitionState {
        let primary = AcquisitionState::ArchiveFetch(ArchiveAttempt::Primary);
        let bytes = match self.fetcher.fetch_live(timestamp).await {
            Ok(FetchOutcome::Found(bytes)) => bytes,
            Ok(FetchOutcome::NotFound) => return primary,
            Err(e) => {
                warn!("Live fetch for {} failed: {}", timestamp, e);
                return primary;
            }
        };

        match self.cache.write(timestamp, &bytes).await {
            Ok(_) => AcquisitionState::Done(Some(RasterSource::Live)),
            Err(e) => {
                error!("Failed to cache live raster for {}: {}", timestamp, e);
                AcquisitionState::Done(None)
            }
        }
    }

    async fn fetch_archive(
        &self,
        timestamp: &NaiveDateTime,
        attempt: ArchiveAttempt,
    ) -> AcquisitionState {
        let key = ArchiveKey::lagged(timestamp, attempt.lag_days());
        let bytes = match self.fetcher.fetch_archive(&key).await {
            Ok(FetchOutcome::Found(bytes)) => bytes,
            Ok(FetchOutcome::NotFound) => {
                debug!("Archive {} not published", key);
                return AcquisitionState::Done(None);
            }
            Err(e) => {
                warn!("Archive fetch {} failed: {}", key, e);
                return AcquisitionState::Done(None);
            }
        };

        // A local failure here counts as an archive that did not yield the hour
        match self.cache.write_archive(&key, &bytes).await {
            Ok(archive_path) => match self.cache.extract_archive_in_place(&archive_path).await {
                Ok(ArchiveStatus::Extracted { .. }) | Ok(ArchiveStatus::Missing) => {}
                Err(e) => error!("Failed to extract archive {}: {}", key, e),
            },
            Err(e) => error!("Failed to save archive {}: {}", key, e),
        }

        if self.cache.exists(timestamp).await {
            return AcquisitionState::Done(Some(attempt.source()));
        }

        match attempt.next() {
            Some(next) => {
                debug!("Archive {} does not contain {}", key, timestamp);
                AcquisitionState::ArchiveFetch(next)
            }
            None => AcquisitionState::Done(None),
        }
    }
}
