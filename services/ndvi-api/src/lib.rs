//! Vegetation timelapse API service library.
//!
//! Exposes the pipeline, configuration and router so the binaries and the
//! integration tests share one wiring.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod pipeline;
pub mod request;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use pipeline::{Pipeline, PipelineOutcome, Timelapse};
pub use state::AppState;

/// All routes with the standard middleware stack.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/timeseries", post(handlers::timeseries_handler))
        // Health check
        .route("/health", get(handlers::health_handler))
        // Metrics
        .route("/metrics", get(handlers::metrics_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
