//! Error types for raster access and cube assembly.

use ndvi_common::PipelineError;
use projection::ProjectionError;
use stac_client::StacError;
use thiserror::Error;

/// Result type alias for raster operations.
pub type RasterResult<T> = Result<T, RasterError>;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("HTTP error: {0}")]
    Http(#[from] StacError),

    #[error("Server ignored Range request for {url}")]
    RangeNotSupported { url: String },

    #[error("Invalid TIFF: {0}")]
    InvalidTiff(String),

    #[error("Unsupported TIFF compression: {0}")]
    UnsupportedCompression(u16),

    #[error("Unsupported TIFF predictor: {0}")]
    UnsupportedPredictor(u16),

    #[error("Unsupported sample type: {bits} bits, format {format}")]
    UnsupportedDataType { bits: u16, format: u16 },

    #[error("Decompression failed: {0}")]
    Decompress(String),

    #[error("Missing georeferencing: {0}")]
    MissingGeoreference(String),

    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("Signed reference for scene {scene} band {band} expired at {expired_at}")]
    ExpiredHref {
        scene: String,
        band: String,
        expired_at: String,
    },

    #[error("Invalid target grid: {0}")]
    InvalidGrid(String),

    #[error("Failed to read {band} of scene {scene}: {source}")]
    Scene {
        scene: String,
        band: String,
        #[source]
        source: Box<RasterError>,
    },
}

impl RasterError {
    pub fn invalid_tiff(reason: impl Into<String>) -> Self {
        Self::InvalidTiff(reason.into())
    }

    /// Attach scene and band context to a read failure.
    pub fn in_scene(self, scene: &str, band: &str) -> Self {
        Self::Scene {
            scene: scene.to_string(),
            band: band.to_string(),
            source: Box::new(self),
        }
    }
}

impl From<RasterError> for PipelineError {
    fn from(err: RasterError) -> Self {
        PipelineError::Upstream(err.to_string())
    }
}
