//! Projected coordinate to grid cell resolution
//!
//! RainGRS rasters share one fixed grid, so a point resolves to the same
//! cell for every hour and is resolved once per extraction.

use serde::{Deserialize, Serialize};

use crate::app::models::{GridCell, PlanarPoint};
use crate::constants::grid;
use crate::errors::{ExtractionError, ExtractionResult};

/// Geometry of the fixed raster grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cell edge length in grid units (metres)
    pub cell_size: f64,
    /// Easting of the grid origin
    pub x_offset: f64,
    /// Northing of the grid origin
    pub y_offset: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: grid::CELL_SIZE,
            x_offset: grid::X_OFFSET,
            y_offset: grid::Y_OFFSET,
        }
    }
}

/// Maps planar coordinates to grid cells
///
/// `col = round((x - x_offset) / cell_size)` and
/// `row = round((y - y_offset) / cell_size)`, rounding half to even.
/// No bounds checking happens here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridResolver {
    config: GridConfig,
}

impl GridResolver {
    pub fn new(config: GridConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Resolve a projected coordinate to its nearest grid cell
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::NonFiniteCoordinate`] if either coordinate
    /// is NaN or infinite.
    pub fn resolve(&self, point: PlanarPoint) -> ExtractionResult<GridCell> {
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(ExtractionError::NonFiniteCoordinate {
                x: point.x,
                y: point.y,
            });
        }

        // Easting selects the column, northing the array row (row 0 is the
        // first data line of the file)
        let col = ((point.x - self.config.x_offset) / self.config.cell_size).round_ties_even();
        let row = ((point.y - self.config.y_offset) / self.config.cell_size).round_ties_even();

        Ok(GridCell::new(row as i64, col as i64))
    }
}

impl Default for GridResolver {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}
