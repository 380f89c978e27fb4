//! Unit tests for series extraction
//!
//! Points are "projected" by an identity projector (longitude as easting,
//! latitude as northing) so grid cells can be chosen directly.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use super::*;
use crate::app::cache::CacheConfig;
use crate::app::models::PlanarPoint;
use crate::errors::ProjectionResult;

const GRID: &str = "ncols 3\nnrows 3\nxllcorner 50000\nyllcorner 30000\ncellsize 1000\nNODATA_value -99\n\
0.0 0.1 0.2\n\
1.0 -99 1.2\n\
2.0 2.1 2.2\n";

struct IdentityProjector;

impl Projector for IdentityProjector {
    fn project(&self, point: &GeoPoint) -> ProjectionResult<PlanarPoint> {
        Ok(PlanarPoint::new(point.longitude, point.latitude))
    }
}

fn at(h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 20)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn planar(x: f64, y: f64, label: &str) -> GeoPoint {
    GeoPoint::new(y, x).with_label(label)
}

async fn setup(config: ExtractionConfig) -> (SeriesExtractor, Arc<RasterCache>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let cache = Arc::new(
        RasterCache::new(CacheConfig::with_cache_root(temp_dir.path().to_path_buf()))
            .await
            .unwrap(),
    );
    let extractor = SeriesExtractor::new(
        cache.clone(),
        Arc::new(IdentityProjector),
        Box::new(NearestCell::default()),
        config,
    );
    (extractor, cache, temp_dir)
}

#[tokio::test]
async fn test_rows_ordered_by_hour_then_point() {
    let (extractor, cache, _temp_dir) = setup(ExtractionConfig::default()).await;
    cache.write(&at(0), GRID.as_bytes()).await.unwrap();
    cache.write(&at(1), GRID.as_bytes()).await.unwrap();

    let points = vec![planar(52_000.0, 31_000.0, "b"), planar(50_000.0, 30_000.0, "a")];
    let range = TimeRange::new(at(0), at(1)).unwrap();
    let output = extractor.extract_series(&range, &points).await;

    assert!(output.is_clean());
    let order: Vec<_> = output
        .rows
        .iter()
        .map(|row| (row.timestamp, row.point.display_name()))
        .collect();
    assert_eq!(
        order,
        vec![
            (at(0), "b".to_string()),
            (at(0), "a".to_string()),
            (at(1), "b".to_string()),
            (at(1), "a".to_string()),
        ]
    );
    assert_eq!(output.rows[0].cell, GridCell::new(1, 2));
    assert_eq!(output.rows[0].value, Some(1.2));
    assert_eq!(output.rows[1].value, Some(0.0));
}

#[tokio::test]
async fn test_sentinel_cells_are_missing() {
    let (extractor, cache, _temp_dir) = setup(ExtractionConfig::default()).await;
    cache.write(&at(0), GRID.as_bytes()).await.unwrap();

    let points = vec![planar(51_000.0, 31_000.0, "nodata")];
    let output = extractor
        .extract_series(&TimeRange::single(at(0)).unwrap(), &points)
        .await;

    assert_eq!(output.rows.len(), 1);
    assert_eq!(output.rows[0].value, None);
    assert!(output.rows.iter().all(|row| row.value != Some(-99.0)));
}

#[tokio::test]
async fn test_absent_raster_skipped_by_default() {
    let (extractor, cache, _temp_dir) = setup(ExtractionConfig::default()).await;
    cache.write(&at(2), GRID.as_bytes()).await.unwrap();

    let points = vec![planar(50_000.0, 30_000.0, "a")];
    let output = extractor
        .extract_series(&TimeRange::new(at(0), at(2)).unwrap(), &points)
        .await;

    assert!(output.is_clean());
    assert_eq!(output.rows.len(), 1);
    assert_eq!(output.rows[0].timestamp, at(2));
}

#[tokio::test]
async fn test_absent_raster_emitted_as_missing() {
    let config = ExtractionConfig::default().with_missing_raster(MissingRasterPolicy::EmitMissing);
    let (extractor, cache, _temp_dir) = setup(config).await;
    cache.write(&at(1), GRID.as_bytes()).await.unwrap();

    let points = vec![planar(50_000.0, 30_000.0, "a"), planar(52_000.0, 32_000.0, "c")];
    let output = extractor
        .extract_series(&TimeRange::new(at(0), at(1)).unwrap(), &points)
        .await;

    assert_eq!(output.rows.len(), 4);
    assert_eq!(output.rows[0].timestamp, at(0));
    assert_eq!(output.rows[0].value, None);
    assert_eq!(output.rows[1].value, None);
    assert_eq!(output.rows[3].value, Some(2.2));
}

#[tokio::test]
async fn test_out_of_bounds_point_recorded_as_failure() {
    let (extractor, cache, _temp_dir) = setup(ExtractionConfig::default()).await;
    cache.write(&at(0), GRID.as_bytes()).await.unwrap();

    let points = vec![planar(59_000.0, 30_000.0, "east"), planar(50_000.0, 30_000.0, "a")];
    let output = extractor
        .extract_series(&TimeRange::single(at(0)).unwrap(), &points)
        .await;

    assert_eq!(output.rows.len(), 1);
    assert_eq!(output.rows[0].point.display_name(), "a");
    assert_eq!(output.failures.len(), 1);
    let failure = &output.failures[0];
    assert_eq!(failure.timestamp, Some(at(0)));
    assert_eq!(failure.points[0].display_name(), "east");
    assert!(matches!(
        failure.error,
        ExtractionError::OutOfBoundsCell { row: 0, col: 9, .. }
    ));
}

#[tokio::test]
async fn test_malformed_raster_fails_only_its_hour() {
    let (extractor, cache, _temp_dir) = setup(ExtractionConfig::default()).await;
    cache.write(&at(0), b"garbage\n").await.unwrap();
    cache.write(&at(1), GRID.as_bytes()).await.unwrap();

    let points = vec![planar(50_000.0, 30_000.0, "a"), planar(52_000.0, 31_000.0, "b")];
    let output = extractor
        .extract_series(&TimeRange::new(at(0), at(1)).unwrap(), &points)
        .await;

    assert_eq!(output.rows.len(), 2);
    assert!(output.rows.iter().all(|row| row.timestamp == at(1)));
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].timestamp, Some(at(0)));
    assert_eq!(output.failures[0].points.len(), 2);
    assert!(output.failures[0].error.is_malformed_header());
}

#[tokio::test]
async fn test_unlocatable_point_excluded_from_every_hour() {
    let (extractor, cache, _temp_dir) = setup(ExtractionConfig::default()).await;
    cache.write(&at(0), GRID.as_bytes()).await.unwrap();
    cache.write(&at(1), GRID.as_bytes()).await.unwrap();

    let points = vec![planar(f64::NAN, 30_000.0, "nan"), planar(50_000.0, 30_000.0, "a")];
    let output = extractor
        .extract_series(&TimeRange::new(at(0), at(1)).unwrap(), &points)
        .await;

    assert_eq!(output.rows.len(), 2);
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].timestamp, None);
    assert!(matches!(
        output.failures[0].error,
        ExtractionError::NonFiniteCoordinate { .. }
    ));

    let report = FailureReport::from(&output.failures[0]);
    assert_eq!(report.points, vec!["nan".to_string()]);
}
