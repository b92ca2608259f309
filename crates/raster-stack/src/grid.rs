//! The regular geographic grid every scene is resampled onto.

use ndvi_common::BoundingBox;
use projection::EPSG_WGS84;

use crate::error::{RasterError, RasterResult};

/// Target resolution in degrees (about 11 m at the equator).
pub const DEFAULT_RESOLUTION_DEG: f64 = 0.0001;

/// A north-up EPSG:4326 grid covering a bounding box.
///
/// Row 0 is the northern edge; pixel centers sit at half-cell offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetGrid {
    pub bbox: BoundingBox,
    /// Cell size in degrees
    pub resolution: f64,
    pub width: usize,
    pub height: usize,
}

impl TargetGrid {
    pub fn new(bbox: BoundingBox, resolution: f64) -> RasterResult<Self> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(RasterError::InvalidGrid(format!(
                "resolution must be positive, got {}",
                resolution
            )));
        }
        let width = (bbox.width() / resolution).round();
        let height = (bbox.height() / resolution).round();
        if !(width >= 1.0 && height >= 1.0) {
            return Err(RasterError::InvalidGrid(format!(
                "bbox {:?} is smaller than one {}° cell",
                bbox.to_array(),
                resolution
            )));
        }
        Ok(Self {
            bbox,
            resolution,
            width: width as usize,
            height: height as usize,
        })
    }

    pub fn epsg(&self) -> u32 {
        EPSG_WGS84
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Geographic `(lon, lat)` of a pixel center.
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.bbox.min_lon + (col as f64 + 0.5) * self.resolution,
            self.bbox.max_lat - (row as f64 + 0.5) * self.resolution,
        )
    }

    /// All pixel centers in row-major order.
    pub fn pixel_centers(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        (0..self.height).flat_map(move |r| (0..self.width).map(move |c| self.pixel_center(r, c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_point_grid_is_300_square() {
        let grid = TargetGrid::new(
            BoundingBox::around_point(-73.9665, 40.7812, 0.015),
            DEFAULT_RESOLUTION_DEG,
        )
        .unwrap();
        assert_eq!(grid.width, 300);
        assert_eq!(grid.height, 300);
        assert_eq!(grid.len(), 90_000);
    }

    #[test]
    fn test_pixel_centers() {
        let grid = TargetGrid::new(BoundingBox::new(10.0, 20.0, 10.004, 20.002), 0.001).unwrap();
        assert_eq!((grid.width, grid.height), (4, 2));
        let (lon, lat) = grid.pixel_center(0, 0);
        assert!((lon - 10.0005).abs() < 1e-12);
        assert!((lat - 20.0015).abs() < 1e-12);
        let (lon, lat) = grid.pixel_center(1, 3);
        assert!((lon - 10.0035).abs() < 1e-12);
        assert!((lat - 20.0005).abs() < 1e-12);
        assert_eq!(grid.pixel_centers().count(), 8);
    }

    #[test]
    fn test_rejects_degenerate() {
        assert!(TargetGrid::new(BoundingBox::new(0.0, 0.0, 0.00001, 1.0), 0.001).is_err());
        assert!(TargetGrid::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0.0).is_err());
    }
}
