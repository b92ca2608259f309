//! Shared test utilities for the NDVI timelapse workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Approximate float assertions
//! - Synthetic reflectance grid generators
//! - Canned catalog and in-memory pixel source doubles
//! - An in-memory GeoTIFF writer for COG reader tests
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your integration tests:
//!
//! ```ignore
//! use test_utils::{StaticCatalog, MemoryPixelSource, assert_approx_eq};
//! ```

pub mod fixtures;
pub mod generators;
pub mod tiff;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use tiff::TiffBuilder;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(0.61234_f64, 0.6123_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);       // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert that every value of a float slice is NaN.
#[macro_export]
macro_rules! assert_all_nan {
    ($values:expr) => {{
        let values = &$values;
        if let Some(pos) = values.iter().position(|v| !v.is_nan()) {
            panic!(
                "assertion failed: expected all NaN, found {:?} at index {}",
                values[pos], pos
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(0.61234, 0.6123, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-0.25, -0.250001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_rejects_nan() {
        assert_approx_eq!(f64::NAN, 0.0, 1.0);
    }

    #[test]
    fn test_assert_all_nan() {
        assert_all_nan!(vec![f32::NAN, f32::NAN]);
        assert_all_nan!([0.0f32; 0]);
    }

    #[test]
    #[should_panic(expected = "index 1")]
    fn test_assert_all_nan_fails() {
        assert_all_nan!([f32::NAN, 0.5]);
    }
}
