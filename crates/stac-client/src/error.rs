//! Error types for catalog access.

use ndvi_common::PipelineError;
use thiserror::Error;

/// Result type alias using StacError.
pub type StacResult<T> = Result<T, StacError>;

#[derive(Debug, Error)]
pub enum StacError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("{context} request failed: {message}")]
    Transport { context: String, message: String },

    #[error("{context} returned HTTP {status}: {body}")]
    Status {
        context: String,
        status: u16,
        body: String,
    },

    #[error("Failed to parse {context} response: {message}")]
    Parse { context: String, message: String },

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Invalid STAC item {id}: {message}")]
    InvalidItem { id: String, message: String },

    #[error("STAC search matched more than {limit} items; narrow the date range")]
    TooManyItems { limit: usize },
}

impl StacError {
    pub fn transport(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            context: context.into(),
            message: err.to_string(),
        }
    }

    pub fn parse(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: err.to_string(),
        }
    }

    pub fn invalid_item(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidItem {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Transport failures, 5xx and 429 are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            StacError::Transport { .. } => true,
            StacError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<StacError> for PipelineError {
    fn from(err: StacError) -> Self {
        PipelineError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> StacError {
        StacError::Status {
            context: "search".into(),
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn test_retryable_classification() {
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(StacError::transport("search", "connection reset").is_retryable());
        assert!(!StacError::parse("search", "eof").is_retryable());
    }

    #[test]
    fn test_maps_to_upstream() {
        let err: PipelineError = status(502).into();
        assert_eq!(err.http_status_code(), 500);
        assert!(err.to_string().contains("HTTP 502"));
    }
}
