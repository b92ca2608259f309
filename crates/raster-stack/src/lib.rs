//! Raster access and cube assembly.
//!
//! Reads the band assets of catalog scenes (Cloud-Optimized GeoTIFFs over
//! HTTP Range requests by default), resamples them onto a shared
//! geographic grid and stacks them into a (band, time, row, column) cube.

pub mod builder;
pub mod cog;
pub mod cube;
pub mod error;
pub mod grid;
pub mod resample;
pub mod source;

pub use builder::{RasterStack, StackOptions};
pub use cog::{CogOptions, CogPixelSource};
pub use cube::RasterCube;
pub use error::{RasterError, RasterResult};
pub use grid::{TargetGrid, DEFAULT_RESOLUTION_DEG};
pub use source::{PixelSource, SourceWindow};
