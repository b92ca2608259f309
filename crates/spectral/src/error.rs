use ndvi_common::{Band, PipelineError};
use thiserror::Error;

pub type SpectralResult<T> = Result<T, SpectralError>;

#[derive(Debug, Error, PartialEq)]
pub enum SpectralError {
    #[error("Band {0} is not present in the raster cube")]
    MissingBand(Band),

    #[error("Index layer needs {expected} values, got {actual}")]
    LayerSize { expected: usize, actual: usize },
}

impl From<SpectralError> for PipelineError {
    fn from(err: SpectralError) -> Self {
        PipelineError::Upstream(err.to_string())
    }
}
