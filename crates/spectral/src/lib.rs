//! Vegetation index computation and spatial reduction.
//!
//! [`normalized_difference`] turns two bands of a [`raster_stack::RasterCube`]
//! into an [`IndexLayer`]; [`reduce`] collapses that layer into one mean
//! value per acquisition date.

pub mod error;
pub mod index;
pub mod timeseries;

pub use error::{SpectralError, SpectralResult};
pub use index::{ndvi, normalized_difference, IndexLayer};
pub use timeseries::{mean_finite, reduce, round4, TimeSeriesPoint};
