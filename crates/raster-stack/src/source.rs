//! The pixel-fetch seam and the windows it returns.

use async_trait::async_trait;

use ndvi_common::{BoundingBox, SignedHref};

use crate::error::RasterResult;

/// A north-up block of source pixels in the scene's native CRS.
#[derive(Debug, Clone)]
pub struct SourceWindow {
    pub epsg: u32,
    /// X of the window's left edge
    pub origin_x: f64,
    /// Y of the window's top edge
    pub origin_y: f64,
    /// Cell width in CRS units
    pub pixel_width: f64,
    /// Cell height in CRS units (positive)
    pub pixel_height: f64,
    pub width: usize,
    pub height: usize,
    /// Row-major; nodata already mapped to NaN
    pub data: Vec<f32>,
}

impl SourceWindow {
    /// A window with no pixels; every sample is NaN.
    pub fn empty(epsg: u32) -> Self {
        Self {
            epsg,
            origin_x: 0.0,
            origin_y: 0.0,
            pixel_width: 1.0,
            pixel_height: 1.0,
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    /// Nearest-neighbour lookup of the cell containing `(x, y)`.
    pub fn sample(&self, x: f64, y: f64) -> f32 {
        let col = ((x - self.origin_x) / self.pixel_width).floor();
        let row = ((self.origin_y - y) / self.pixel_height).floor();
        if !(col >= 0.0 && row >= 0.0) {
            return f32::NAN;
        }
        let (col, row) = (col as usize, row as usize);
        if col >= self.width || row >= self.height {
            return f32::NAN;
        }
        self.data[row * self.width + col]
    }
}

/// Reads the pixels of one band asset that cover a geographic area.
#[async_trait]
pub trait PixelSource: Send + Sync {
    /// Fetch the source pixels under `bbox` (WGS84 degrees).
    ///
    /// `epsg_hint` is the CRS advertised by the catalog; implementations may
    /// prefer the CRS recorded in the file itself. Areas outside the raster
    /// yield an empty or partial window, not an error.
    async fn read_window(
        &self,
        href: &SignedHref,
        epsg_hint: Option<u32>,
        bbox: &BoundingBox,
    ) -> RasterResult<SourceWindow>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_nearest() {
        let w = SourceWindow {
            epsg: 32618,
            origin_x: 1000.0,
            origin_y: 2000.0,
            pixel_width: 10.0,
            pixel_height: 10.0,
            width: 2,
            height: 2,
            data: vec![1.0, 2.0, 3.0, 4.0],
        };
        assert_eq!(w.sample(1005.0, 1995.0), 1.0);
        assert_eq!(w.sample(1019.9, 1995.0), 2.0);
        assert_eq!(w.sample(1000.0, 1980.1), 3.0);
        assert_eq!(w.sample(1015.0, 1985.0), 4.0);
        assert!(w.sample(999.0, 1995.0).is_nan());
        assert!(w.sample(1005.0, 2001.0).is_nan());
        assert!(w.sample(1020.0, 1995.0).is_nan());
        assert!(SourceWindow::empty(4326).sample(0.0, 0.0).is_nan());
    }
}
