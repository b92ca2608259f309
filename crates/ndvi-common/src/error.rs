//! Error taxonomy for the timelapse pipeline.

use thiserror::Error;

use crate::time::TimeParseError;

/// Result type alias using PipelineError.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Primary error type surfaced by the pipeline and its HTTP edge.
#[derive(Debug, Error)]
pub enum PipelineError {
    // === Validation Errors ===
    #[error("Missing coordinates")]
    MissingCoordinates,

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    // === Data Errors ===
    #[error("No data found for this location")]
    NotFound,

    // === Upstream Errors ===
    #[error("{0}")]
    Upstream(String),

    // === Infrastructure Errors ===
    #[error("Service unavailable: {0}")]
    Overloaded(String),
}

impl PipelineError {
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// True for errors caused by the caller's input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingCoordinates
                | PipelineError::InvalidParameter { .. }
                | PipelineError::InvalidTime(_)
        )
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            PipelineError::MissingCoordinates
            | PipelineError::InvalidParameter { .. }
            | PipelineError::InvalidTime(_) => 400,

            PipelineError::NotFound => 404,

            PipelineError::Overloaded(_) => 503,

            PipelineError::Upstream(_) => 500,
        }
    }

    /// Short label used for the `outcome` metric dimension.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            e if e.is_validation() => "invalid",
            PipelineError::NotFound => "no_data",
            PipelineError::Overloaded(_) => "overloaded",
            _ => "error",
        }
    }
}

impl From<TimeParseError> for PipelineError {
    fn from(err: TimeParseError) -> Self {
        PipelineError::InvalidTime(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Upstream(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PipelineError::MissingCoordinates.http_status_code(), 400);
        assert_eq!(
            PipelineError::invalid_parameter("lat", "out of range").http_status_code(),
            400
        );
        assert_eq!(PipelineError::NotFound.http_status_code(), 404);
        assert_eq!(PipelineError::upstream("boom").http_status_code(), 500);
        assert_eq!(
            PipelineError::Overloaded("queue full".into()).http_status_code(),
            503
        );
    }

    #[test]
    fn test_messages_match_api_contract() {
        assert_eq!(PipelineError::MissingCoordinates.to_string(), "Missing coordinates");
        assert_eq!(
            PipelineError::NotFound.to_string(),
            "No data found for this location"
        );
        assert_eq!(PipelineError::upstream("catalog down").to_string(), "catalog down");
    }

    #[test]
    fn test_time_error_is_validation() {
        let err: PipelineError = TimeParseError::InvalidFormat("nope".into()).into();
        assert!(err.is_validation());
        assert_eq!(err.outcome_label(), "invalid");
    }
}
