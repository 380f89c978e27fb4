//! Cell location and value sampling
//!
//! [`NearestCell`] reads the single cell a point resolves to. Other sampling
//! schemes plug in through [`SamplingStrategy`].

use crate::app::grid::GridResolver;
use crate::app::models::{GridCell, PlanarPoint};
use crate::app::raster::RasterGrid;
use crate::errors::ExtractionResult;

/// How a projected point maps to a value in a raster
pub trait SamplingStrategy: Send + Sync {
    /// Cell a point reads from, computed once per point
    fn locate(&self, point: PlanarPoint) -> ExtractionResult<GridCell>;

    /// Value for a located cell, `Ok(None)` when the raster holds no data there
    fn sample(&self, grid: &RasterGrid, cell: GridCell) -> ExtractionResult<Option<f64>>;
}

/// Value of the nearest grid cell
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestCell {
    resolver: GridResolver,
}

impl NearestCell {
    pub fn new(resolver: GridResolver) -> Self {
        Self { resolver }
    }
}

impl SamplingStrategy for NearestCell {
    fn locate(&self, point: PlanarPoint) -> ExtractionResult<GridCell> {
        self.resolver.resolve(point)
    }

    fn sample(&self, grid: &RasterGrid, cell: GridCell) -> ExtractionResult<Option<f64>> {
        grid.value_at(cell)
    }
}
