//! Point time series extraction from cached rasters
//!
//! Each point is projected and located once; every hour of the range then
//! reads its raster from the cache a single time and samples all points from
//! it. Rows come out ordered by hour, then by input point order.
//!
//! A failure only removes the rows it affects. It is reported next to the
//! rows as a [`RowFailure`] naming the hour and points involved.

pub mod config;
pub mod strategy;

#[cfg(test)]
pub mod tests;

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::cache::RasterCache;
use crate::app::models::{GeoPoint, GridCell, SeriesRow, TimeRange};
use crate::app::projection::Projector;
use crate::errors::ExtractionError;

pub use config::{ExtractionConfig, MissingRasterPolicy};
pub use strategy::{NearestCell, SamplingStrategy};

/// Rows that could not be produced, with the reason
#[derive(Debug)]
pub struct RowFailure {
    /// Hour involved; `None` when the point itself could not be located
    pub timestamp: Option<NaiveDateTime>,
    /// Points whose rows were dropped
    pub points: Vec<GeoPoint>,
    pub error: ExtractionError,
}

/// Result of an extraction run
#[derive(Debug, Default)]
pub struct SeriesOutput {
    pub rows: Vec<SeriesRow>,
    pub failures: Vec<RowFailure>,
}

impl SeriesOutput {
    /// True when no row was dropped
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Serializable view of a [`RowFailure`] for reporting
#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub timestamp: Option<NaiveDateTime>,
    pub points: Vec<String>,
    pub error: String,
}

impl From<&RowFailure> for FailureReport {
    fn from(failure: &RowFailure) -> Self {
        Self {
            timestamp: failure.timestamp,
            points: failure.points.iter().map(GeoPoint::display_name).collect(),
            error: failure.error.to_string(),
        }
    }
}

/// Extracts per-point series from the raster cache
pub struct SeriesExtractor {
    cache: Arc<RasterCache>,
    projector: Arc<dyn Projector>,
    strategy: Box<dyn SamplingStrategy>,
    config: ExtractionConfig,
}

impl SeriesExtractor {
    pub fn new(
        cache: Arc<RasterCache>,
        projector: Arc<dyn Projector>,
        strategy: Box<dyn SamplingStrategy>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            cache,
            projector,
            strategy,
            config,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Locate every point on the grid, recording those that fail
    fn locate_points(
        &self,
        points: &[GeoPoint],
        failures: &mut Vec<RowFailure>,
    ) -> Vec<(GeoPoint, GridCell)> {
        let mut located = Vec::with_capacity(points.len());
        for point in points {
            let cell = self
                .projector
                .project(point)
                .map_err(ExtractionError::from)
                .and_then(|planar| self.strategy.locate(planar));

            match cell {
                Ok(cell) => {
                    debug!("{} resolves to cell {}", point.display_name(), cell);
                    located.push((point.clone(), cell));
                }
                Err(error) => {
                    warn!("Cannot locate {}: {}", point.display_name(), error);
                    failures.push(RowFailure {
                        timestamp: None,
                        points: vec![point.clone()],
                        error,
                    });
                }
            }
        }
        located
    }

    /// Extract the value series of `points` over `range`
    pub async fn extract_series(&self, range: &TimeRange, points: &[GeoPoint]) -> SeriesOutput {
        let mut output = SeriesOutput::default();
        let located = self.locate_points(points, &mut output.failures);
        if located.is_empty() {
            return output;
        }

        for timestamp in range.hours() {
            if !self.cache.exists(&timestamp).await {
                match self.config.missing_raster {
                    MissingRasterPolicy::Skip => {
                        debug!("No raster for {}, skipping", timestamp);
                    }
                    MissingRasterPolicy::EmitMissing => {
                        output.rows.extend(located.iter().map(|(point, cell)| SeriesRow {
                            timestamp,
                            point: point.clone(),
                            cell: *cell,
                            value: None,
                        }));
                    }
                }
                continue;
            }

            let grid = match self.cache.read(&timestamp).await {
                Ok(grid) => grid,
                Err(e) => {
                    let error = ExtractionError::from(e);
                    warn!("Cannot read raster for {}: {}", timestamp, error);
                    output.failures.push(RowFailure {
                        timestamp: Some(timestamp),
                        points: located.iter().map(|(point, _)| point.clone()).collect(),
                        error,
                    });
                    continue;
                }
            };

            for (point, cell) in &located {
                match self.strategy.sample(&grid, *cell) {
                    Ok(value) => output.rows.push(SeriesRow {
                        timestamp,
                        point: point.clone(),
                        cell: *cell,
                        value,
                    }),
                    Err(error) => output.failures.push(RowFailure {
                        timestamp: Some(timestamp),
                        points: vec![point.clone()],
                        error,
                    }),
                }
            }
        }

        info!(
            "Extracted {} rows for {} points over {} ({} failures)",
            output.rows.len(),
            located.len(),
            range,
            output.failures.len()
        );
        output
    }
}
