//! HTTP request handlers.
//!
//! - `timeseries`: the index time series and timelapse endpoint
//! - `health`: health check and Prometheus metrics

pub mod health;
pub mod timeseries;

pub use health::{health_handler, metrics_handler};
pub use timeseries::{timeseries_handler, FrameEntry, SeriesEntry, TimeseriesResponse};
