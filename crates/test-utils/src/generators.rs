//! Synthetic reflectance data generators.
//!
//! These generators create predictable, verifiable band grids whose
//! vegetation index is known in advance.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that data is being read, windowed and
/// resampled correctly by checking that grid[row][col] == col * 1000 + row.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);  // col=1, row=0
/// assert_eq!(grid[10], 1.0);    // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// A grid with every cell set to `value`.
pub fn constant_band(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// NIR and red grids whose normalized difference is exactly `index`
/// everywhere.
///
/// `red` is fixed at `base`; nir is chosen so that
/// `(nir - red) / (nir + red) == index`. `index` must lie in (-1, 1).
pub fn nir_red_for_index(width: usize, height: usize, index: f32, base: f32) -> (Vec<f32>, Vec<f32>) {
    let nir = base * (1.0 + index) / (1.0 - index);
    (constant_band(width, height, nir), constant_band(width, height, base))
}

/// A horizontal reflectance ramp from `low` (left column) to `high` (right
/// column).
pub fn gradient_band(width: usize, height: usize, low: f32, high: f32) -> Vec<f32> {
    let span = (width.max(2) - 1) as f32;
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..height {
        for col in 0..width {
            data.push(low + (high - low) * col as f32 / span);
        }
    }
    data
}

/// Sentinel-2-like reflectance scaled to u16 digital numbers, with a
/// vegetated left half and bare soil on the right.
pub fn field_and_soil_band(width: usize, height: usize, vegetated: u16, soil: u16) -> Vec<u16> {
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..height {
        for col in 0..width {
            data.push(if col < width / 2 { vegetated } else { soil });
        }
    }
    data
}

/// Overwrite the rectangle `[row0, row1) x [col0, col1)` of a row-major grid
/// with NaN, simulating a cloud mask or nodata hole.
pub fn punch_hole(data: &mut [f32], width: usize, rows: std::ops::Range<usize>, cols: std::ops::Range<usize>) {
    for row in rows {
        for col in cols.clone() {
            if let Some(v) = data.get_mut(row * width + col) {
                *v = f32::NAN;
            }
        }
    }
}
