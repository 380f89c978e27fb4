//! Geographic to planar reprojection
//!
//! Points of interest arrive as WGS84 latitude/longitude while RainGRS grids
//! are laid out in EPSG:2180 (CS92). [`Cs92Projector`] performs the transform
//! with proj4rs; the [`Projector`] trait lets tests substitute fixed
//! coordinates.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::app::models::{GeoPoint, PlanarPoint};
use crate::constants::crs;
use crate::errors::{ProjectionError, ProjectionResult};

/// Projects geographic points into the grid reference system
pub trait Projector: Send + Sync {
    /// Project a point to planar `(x = easting, y = northing)`
    fn project(&self, point: &GeoPoint) -> ProjectionResult<PlanarPoint>;
}

/// WGS84 to EPSG:2180 transverse Mercator projector
pub struct Cs92Projector {
    source: Proj,
    target: Proj,
}

impl std::fmt::Debug for Cs92Projector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cs92Projector")
            .field("source", &crs::GEOGRAPHIC)
            .field("target", &crs::CS92)
            .finish_non_exhaustive()
    }
}

impl Cs92Projector {
    /// Build the projector from the built-in CRS definitions
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::InvalidDefinition`] if proj4rs rejects a
    /// definition string.
    pub fn new() -> ProjectionResult<Self> {
        Ok(Self {
            source: Self::parse(crs::GEOGRAPHIC)?,
            target: Self::parse(crs::CS92)?,
        })
    }

    fn parse(definition: &str) -> ProjectionResult<Proj> {
        Proj::from_proj_string(definition).map_err(|e| ProjectionError::InvalidDefinition {
            definition: definition.to_string(),
            reason: format!("{e:?}"),
        })
    }
}

impl Projector for Cs92Projector {
    fn project(&self, point: &GeoPoint) -> ProjectionResult<PlanarPoint> {
        // proj4rs works in radians for geographic systems, (lon, lat) order
        let mut coords = (
            point.longitude.to_radians(),
            point.latitude.to_radians(),
            0.0,
        );

        transform(&self.source, &self.target, &mut coords).map_err(|e| {
            ProjectionError::TransformFailed {
                latitude: point.latitude,
                longitude: point.longitude,
                reason: format!("{e:?}"),
            }
        })?;

        if !coords.0.is_finite() || !coords.1.is_finite() {
            return Err(ProjectionError::TransformFailed {
                latitude: point.latitude,
                longitude: point.longitude,
                reason: "non-finite result".to_string(),
            });
        }

        Ok(PlanarPoint::new(coords.0, coords.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projector_creation() {
        assert!(Cs92Projector::new().is_ok());
    }

    #[test]
    fn test_central_meridian_maps_to_false_easting() {
        let projector = Cs92Projector::new().unwrap();
        let planar = projector.project(&GeoPoint::new(52.0, 19.0)).unwrap();
        assert!((planar.x - 500_000.0).abs() < 0.01, "x = {}", planar.x);
    }

    #[test]
    fn test_projects_poland_into_grid_extent() {
        let projector = Cs92Projector::new().unwrap();
        let planar = projector
            .project(&GeoPoint::new(51.413447, 21.965275))
            .unwrap();

        // East of the central meridian, roughly 400 km north of the false northing
        assert!(planar.x > 650_000.0 && planar.x < 760_000.0, "x = {}", planar.x);
        assert!(planar.y > 350_000.0 && planar.y < 450_000.0, "y = {}", planar.y);
    }

    #[test]
    fn test_projection_preserves_ordering() {
        let projector = Cs92Projector::new().unwrap();
        let west = projector.project(&GeoPoint::new(51.0, 16.0)).unwrap();
        let east = projector.project(&GeoPoint::new(51.0, 23.0)).unwrap();
        let north = projector.project(&GeoPoint::new(54.0, 16.0)).unwrap();

        assert!(west.x < east.x);
        assert!(north.y > west.y);
    }
}
