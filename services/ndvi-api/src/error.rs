//! HTTP rendering of pipeline errors.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use ndvi_common::PipelineError;

/// A pipeline error on its way out as `{"error": message}`.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub PipelineError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(PipelineError::invalid_parameter("body", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self.0, "Request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_error_kind() {
        assert_eq!(ApiError(PipelineError::MissingCoordinates).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(PipelineError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError(PipelineError::upstream("x")).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError(PipelineError::Overloaded("busy".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
