//! Error types for frame rendering.

use ndvi_common::{Band, PipelineError};
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Expected {expected} values for a {width}x{height} image, got {actual}")]
    SizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Band {0} is required for rendering but missing from the cube")]
    MissingBand(Band),

    #[error("Index layer has no slice {0}")]
    MissingIndexSlice(usize),

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

impl RenderError {
    /// Check that `actual` values fill a `width x height` image.
    pub fn check_size(width: usize, height: usize, actual: usize) -> RenderResult<()> {
        let expected = width * height;
        if actual == expected {
            Ok(())
        } else {
            Err(RenderError::SizeMismatch {
                width,
                height,
                expected,
                actual,
            })
        }
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        PipelineError::Upstream(err.to_string())
    }
}
