//! The 4-D (band, time, row, column) reflectance cube.

use chrono::{DateTime, Utc};

use ndvi_common::Band;

use crate::grid::TargetGrid;

/// Multi-band, multi-date pixel array on a shared [`TargetGrid`].
///
/// Every band shares the same time axis and grid. Pixels with no source
/// data are NaN.
#[derive(Debug, Clone)]
pub struct RasterCube {
    bands: Vec<Band>,
    times: Vec<DateTime<Utc>>,
    scene_ids: Vec<String>,
    grid: TargetGrid,
    /// Band-major, then time, then row-major pixels
    data: Vec<f32>,
}

impl RasterCube {
    /// Allocate a cube filled with NaN.
    pub fn new_nan(
        bands: Vec<Band>,
        times: Vec<DateTime<Utc>>,
        scene_ids: Vec<String>,
        grid: TargetGrid,
    ) -> Self {
        let len = bands.len() * times.len() * grid.len();
        Self {
            bands,
            times,
            scene_ids,
            grid,
            data: vec![f32::NAN; len],
        }
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn grid(&self) -> &TargetGrid {
        &self.grid
    }

    pub fn width(&self) -> usize {
        self.grid.width
    }

    pub fn height(&self) -> usize {
        self.grid.height
    }

    /// Number of time slices.
    pub fn n_times(&self) -> usize {
        self.times.len()
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn scene_ids(&self) -> &[String] {
        &self.scene_ids
    }

    pub fn has_band(&self, band: Band) -> bool {
        self.bands.contains(&band)
    }

    fn band_index(&self, band: Band) -> Option<usize> {
        self.bands.iter().position(|b| *b == band)
    }

    fn offset(&self, band_idx: usize, t: usize) -> usize {
        (band_idx * self.times.len() + t) * self.grid.len()
    }

    /// Row-major pixels of one band at one time slice.
    pub fn slice(&self, band: Band, t: usize) -> Option<&[f32]> {
        let b = self.band_index(band)?;
        if t >= self.times.len() {
            return None;
        }
        let start = self.offset(b, t);
        Some(&self.data[start..start + self.grid.len()])
    }

    pub fn slice_mut(&mut self, band: Band, t: usize) -> Option<&mut [f32]> {
        let b = self.band_index(band)?;
        if t >= self.times.len() {
            return None;
        }
        let start = self.offset(b, t);
        let len = self.grid.len();
        Some(&mut self.data[start..start + len])
    }

    /// Value at `(band, t, row, col)`.
    pub fn get(&self, band: Band, t: usize, row: usize, col: usize) -> Option<f32> {
        if row >= self.grid.height || col >= self.grid.width {
            return None;
        }
        self.slice(band, t).map(|s| s[row * self.grid.width + col])
    }
}
