//! Per-pixel normalized difference indices.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::debug;

use ndvi_common::Band;
use raster_stack::RasterCube;

use crate::error::{SpectralError, SpectralResult};

/// A (time, row, column) layer of index values.
///
/// NaN marks pixels where the index is undefined.
#[derive(Debug, Clone)]
pub struct IndexLayer {
    times: Vec<DateTime<Utc>>,
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl IndexLayer {
    /// Wrap precomputed values; `data` holds `times.len()` row-major slices.
    pub fn from_parts(
        times: Vec<DateTime<Utc>>,
        width: usize,
        height: usize,
        data: Vec<f32>,
    ) -> SpectralResult<Self> {
        let expected = times.len() * width * height;
        if data.len() != expected {
            return Err(SpectralError::LayerSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            times,
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn n_times(&self) -> usize {
        self.times.len()
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// Row-major values of time slice `t`.
    pub fn slice(&self, t: usize) -> Option<&[f32]> {
        let len = self.width * self.height;
        self.data.get(t * len..(t + 1) * len)
    }

    /// Iterate `(timestamp, slice)` pairs in time order.
    pub fn slices(&self) -> impl Iterator<Item = (DateTime<Utc>, &[f32])> + '_ {
        let len = (self.width * self.height).max(1);
        self.times.iter().copied().zip(self.data.chunks(len))
    }
}

/// `(a - b) / (a + b)` for one pixel. NaN inputs and a zero sum give NaN.
#[inline]
pub fn normalized_difference_px(a: f32, b: f32) -> f32 {
    let sum = a + b;
    if sum == 0.0 || a.is_nan() || b.is_nan() {
        f32::NAN
    } else {
        (a - b) / sum
    }
}

/// Compute `(a - b) / (a + b)` for every pixel of every time slice.
///
/// Values are not clipped; reflectance outside the physical range can give
/// results outside [-1, 1].
pub fn normalized_difference(cube: &RasterCube, a: Band, b: Band) -> SpectralResult<IndexLayer> {
    if !cube.has_band(a) {
        return Err(SpectralError::MissingBand(a));
    }
    if !cube.has_band(b) {
        return Err(SpectralError::MissingBand(b));
    }

    let len = cube.width() * cube.height();
    let mut data = vec![f32::NAN; len * cube.n_times()];
    if len > 0 {
        data.par_chunks_mut(len).enumerate().for_each(|(t, out)| {
            if let (Some(sa), Some(sb)) = (cube.slice(a, t), cube.slice(b, t)) {
                for ((dst, &va), &vb) in out.iter_mut().zip(sa).zip(sb) {
                    *dst = normalized_difference_px(va, vb);
                }
            }
        });
    }

    debug!(
        a = %a,
        b = %b,
        slices = cube.n_times(),
        pixels = len,
        "Computed normalized difference"
    );
    Ok(IndexLayer {
        times: cube.times().to_vec(),
        width: cube.width(),
        height: cube.height(),
        data,
    })
}

/// Normalized Difference Vegetation Index: (NIR - red) / (NIR + red).
pub fn ndvi(cube: &RasterCube) -> SpectralResult<IndexLayer> {
    normalized_difference(cube, Band::Nir, Band::Red)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_bands_give_zero() {
        assert_eq!(normalized_difference_px(1200.0, 1200.0), 0.0);
    }

    #[test]
    fn test_zero_sum_is_nan() {
        assert!(normalized_difference_px(0.0, 0.0).is_nan());
        assert!(normalized_difference_px(5.0, -5.0).is_nan());
    }

    #[test]
    fn test_nan_propagates() {
        assert!(normalized_difference_px(f32::NAN, 1.0).is_nan());
        assert!(normalized_difference_px(1.0, f32::NAN).is_nan());
    }

    #[test]
    fn test_no_clipping() {
        // Negative reflectance can push the index past 1
        let v = normalized_difference_px(3.0, -1.0);
        assert_eq!(v, 2.0);
    }

    #[test]
    fn test_known_value() {
        assert_eq!(normalized_difference_px(3000.0, 1000.0), 0.5);
    }

    #[test]
    fn test_layer_slices() {
        let t0 = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let t1 = DateTime::<Utc>::from_timestamp(86_400, 0).unwrap();
        let layer = IndexLayer::from_parts(vec![t0, t1], 2, 1, vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(layer.slice(1), Some(&[0.3f32, 0.4][..]));
        assert_eq!(layer.slice(2), None);
        let collected: Vec<_> = layer.slices().map(|(t, s)| (t, s.len())).collect();
        assert_eq!(collected, vec![(t0, 2), (t1, 2)]);
    }

    #[test]
    fn test_from_parts_rejects_wrong_length() {
        let t0 = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let err = IndexLayer::from_parts(vec![t0], 2, 2, vec![0.1; 3]).unwrap_err();
        assert_eq!(err, SpectralError::LayerSize { expected: 4, actual: 3 });
    }
}
