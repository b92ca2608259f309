//! Nearest-neighbour resampling from scene CRS onto the target grid.

use projection::Crs;

use crate::error::RasterResult;
use crate::grid::TargetGrid;
use crate::source::SourceWindow;

/// Target pixel centers projected into one CRS, reusable across windows.
#[derive(Debug, Clone)]
pub struct ProjectedCenters {
    pub epsg: u32,
    coords: Vec<(f64, f64)>,
}

impl ProjectedCenters {
    pub fn new(grid: &TargetGrid, epsg: u32) -> RasterResult<Self> {
        let crs = Crs::from_epsg(epsg)?;
        let coords = grid
            .pixel_centers()
            .map(|(lon, lat)| crs.from_geographic(lon, lat))
            .collect();
        Ok(Self { epsg, coords })
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Fill `out` (row-major, one value per target pixel) from `window`.
///
/// Pixels outside the window, or on source nodata, become NaN.
pub fn resample_nearest(window: &SourceWindow, centers: &ProjectedCenters, out: &mut [f32]) {
    debug_assert_eq!(window.epsg, centers.epsg);
    for (dst, &(x, y)) in out.iter_mut().zip(centers.coords.iter()) {
        *dst = window.sample(x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndvi_common::BoundingBox;

    #[test]
    fn test_geographic_identity_resample() {
        let grid = TargetGrid::new(BoundingBox::new(0.0, 0.0, 0.002, 0.002), 0.001).unwrap();
        // Finer 5x5 source covering the same area
        let window = SourceWindow {
            epsg: 4326,
            origin_x: 0.0,
            origin_y: 0.002,
            pixel_width: 0.0004,
            pixel_height: 0.0004,
            width: 5,
            height: 5,
            data: (0..25).map(|v| v as f32).collect(),
        };
        let centers = ProjectedCenters::new(&grid, 4326).unwrap();
        let mut out = vec![f32::NAN; grid.len()];
        resample_nearest(&window, &centers, &mut out);
        // Target centers at 0.0005/0.0015 fall on source cells 1 and 3
        assert_eq!(out, vec![6.0, 8.0, 16.0, 18.0]);
    }

    #[test]
    fn test_outside_window_is_nan() {
        let grid = TargetGrid::new(BoundingBox::new(0.0, 0.0, 0.002, 0.001), 0.001).unwrap();
        let window = SourceWindow {
            epsg: 4326,
            origin_x: 0.0,
            origin_y: 0.001,
            pixel_width: 0.001,
            pixel_height: 0.001,
            width: 1,
            height: 1,
            data: vec![42.0],
        };
        let centers = ProjectedCenters::new(&grid, 4326).unwrap();
        let mut out = vec![0.0; 2];
        resample_nearest(&window, &centers, &mut out);
        assert_eq!(out[0], 42.0);
        assert!(out[1].is_nan());
    }

    #[test]
    fn test_unsupported_crs() {
        let grid = TargetGrid::new(BoundingBox::new(0.0, 0.0, 0.002, 0.001), 0.001).unwrap();
        assert!(ProjectedCenters::new(&grid, 3857).is_err());
    }
}
