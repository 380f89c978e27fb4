//! End-to-end acquisition tests through the public API
//!
//! An in-memory upstream stands in for the IMGW data store and counts
//! requests, so fallback order and idempotency can be observed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use imgw_raingrs::app::models::{raster_file_name, ArchiveKey, GeoPoint, PlanarPoint, TimeRange};
use imgw_raingrs::app::{
    CacheConfig, ExtractionConfig, FetchOutcome, GridConfig, Projector, RainGrs, RasterCache,
    SourceFetcher,
};
use imgw_raingrs::errors::{DownloadResult, ProjectionResult};

const RASTER: &str =
    "ncols 2\nnrows 2\nxllcorner 50000\nyllcorner 30000\ncellsize 1000\nNODATA_value -1\n0.0 0.3\n-1 1.7\n";

/// Upstream with a fixed set of live hours and archive days
#[derive(Default)]
struct MemoryUpstream {
    live: HashMap<NaiveDateTime, Vec<u8>>,
    archives: HashMap<NaiveDate, Vec<u8>>,
    live_requests: AtomicUsize,
    archive_requests: AtomicUsize,
}

impl MemoryUpstream {
    fn requests(&self) -> usize {
        self.live_requests.load(Ordering::SeqCst) + self.archive_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for MemoryUpstream {
    async fn fetch_live(&self, timestamp: &NaiveDateTime) -> DownloadResult<FetchOutcome> {
        self.live_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .live
            .get(timestamp)
            .cloned()
            .map_or(FetchOutcome::NotFound, FetchOutcome::Found))
    }

    async fn fetch_archive(&self, key: &ArchiveKey) -> DownloadResult<FetchOutcome> {
        self.archive_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .archives
            .get(&key.day())
            .cloned()
            .map_or(FetchOutcome::NotFound, FetchOutcome::Found))
    }
}

struct IdentityProjector;

impl Projector for IdentityProjector {
    fn project(&self, point: &GeoPoint) -> ProjectionResult<PlanarPoint> {
        Ok(PlanarPoint::new(point.longitude, point.latitude))
    }
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn archive(hours: &[NaiveDateTime]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for hour in hours {
        let mut header = tar::Header::new_gnu();
        header.set_size(RASTER.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(
                &mut header,
                format!("grs_60_asc/{}", raster_file_name(hour)),
                RASTER.as_bytes(),
            )
            .unwrap();
    }
    builder.into_inner().unwrap()
}

async fn raingrs(upstream: Arc<MemoryUpstream>, cache_dir: &TempDir) -> RainGrs {
    let cache = RasterCache::new(CacheConfig::with_cache_root(cache_dir.path().join("grs_asc")))
        .await
        .unwrap();
    RainGrs::with_components(
        Arc::new(cache),
        upstream,
        Arc::new(IdentityProjector),
        GridConfig::default(),
        ExtractionConfig::default(),
    )
}

#[tokio::test]
async fn test_mixed_sources_over_a_day_boundary() {
    let mut upstream = MemoryUpstream::default();
    // Newest hour still on the live feed, older ones only in archives
    upstream.live.insert(at(21, 1), RASTER.as_bytes().to_vec());
    upstream
        .archives
        .insert(NaiveDate::from_ymd_opt(2024, 7, 22).unwrap(), archive(&[at(20, 22)]));
    upstream
        .archives
        .insert(NaiveDate::from_ymd_opt(2024, 7, 21).unwrap(), archive(&[at(20, 23)]));
    let upstream = Arc::new(upstream);

    let cache_dir = TempDir::new().unwrap();
    let raingrs = raingrs(upstream.clone(), &cache_dir).await;

    let range = TimeRange::new(at(20, 22), at(21, 1)).unwrap();
    let record = raingrs.acquire(&range).await;

    assert_eq!(record.len(), 4);
    assert_eq!(record.get(&at(20, 22)), Some(true));
    assert_eq!(record.get(&at(20, 23)), Some(true));
    assert_eq!(record.get(&at(21, 0)), Some(false));
    assert_eq!(record.get(&at(21, 1)), Some(true));

    let stats = record.stats();
    assert_eq!(stats.live, 1);
    assert_eq!(stats.archive_primary, 1);
    assert_eq!(stats.archive_fallback, 1);
    assert_eq!(stats.unavailable, 1);

    // Archives are kept flat next to the rasters
    assert!(cache_dir
        .path()
        .join("grs_asc")
        .join("grs_60_asc_2024-07-22.tar")
        .exists());
}

#[tokio::test]
async fn test_second_pass_needs_no_requests() {
    let mut upstream = MemoryUpstream::default();
    upstream.live.insert(at(20, 10), RASTER.as_bytes().to_vec());
    upstream.live.insert(at(20, 11), RASTER.as_bytes().to_vec());
    let upstream = Arc::new(upstream);

    let cache_dir = TempDir::new().unwrap();
    let raingrs = raingrs(upstream.clone(), &cache_dir).await;
    let range = TimeRange::new(at(20, 10), at(20, 11)).unwrap();

    let first = raingrs.acquire(&range).await;
    let requests = upstream.requests();
    let second = raingrs.acquire(&range).await;

    assert!(first.is_complete());
    assert!(second.is_complete());
    assert_eq!(second.stats().cached, 2);
    assert_eq!(upstream.requests(), requests);
}

#[tokio::test]
async fn test_nothing_published_writes_nothing() {
    let upstream = Arc::new(MemoryUpstream::default());
    let cache_dir = TempDir::new().unwrap();
    let raingrs = raingrs(upstream.clone(), &cache_dir).await;

    let record = raingrs.acquire(&TimeRange::single(at(20, 15)).unwrap()).await;

    assert_eq!(record.get(&at(20, 15)), Some(false));
    assert_eq!(upstream.live_requests.load(Ordering::SeqCst), 1);
    assert_eq!(upstream.archive_requests.load(Ordering::SeqCst), 1);
    let entries = std::fs::read_dir(cache_dir.path().join("grs_asc"))
        .unwrap()
        .count();
    assert_eq!(entries, 0);
}

#[tokio::test]
async fn test_fetch_series_acquires_then_extracts() {
    let mut upstream = MemoryUpstream::default();
    upstream.live.insert(at(20, 15), RASTER.as_bytes().to_vec());
    let upstream = Arc::new(upstream);

    let cache_dir = TempDir::new().unwrap();
    let raingrs = raingrs(upstream, &cache_dir).await;

    let points = vec![
        GeoPoint::new(30_000.0, 51_000.0).with_label("first-row"),
        GeoPoint::new(31_000.0, 50_000.0).with_label("nodata"),
    ];
    let range = TimeRange::new(at(20, 15), at(20, 16)).unwrap();
    let report = raingrs.fetch_series(&range, &points).await;

    assert_eq!(report.record.available_count(), 1);
    assert!(report.series.is_clean());
    assert_eq!(report.series.rows.len(), 2);
    assert_eq!(report.series.rows[0].value, Some(0.3));
    assert_eq!(report.series.rows[1].value, None);
}
