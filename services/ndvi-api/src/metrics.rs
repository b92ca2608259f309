//! Prometheus metrics for the pipeline and its HTTP edge.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const REQUESTS_TOTAL: &str = "ndvi_requests_total";
pub const SCENES_TOTAL: &str = "ndvi_scenes_total";
pub const PIPELINE_DURATION: &str = "ndvi_pipeline_duration_seconds";
pub const PIPELINES_IN_FLIGHT: &str = "ndvi_pipelines_in_flight";

/// Install the global Prometheus recorder and register metric help texts.
pub fn install_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    describe_counter!(REQUESTS_TOTAL, "Timeseries requests by outcome");
    describe_counter!(SCENES_TOTAL, Unit::Count, "Scenes returned by catalog searches");
    describe_histogram!(PIPELINE_DURATION, Unit::Seconds, "End-to-end pipeline duration");
    describe_gauge!(PIPELINES_IN_FLIGHT, "Pipelines currently running");
    Ok(handle)
}

/// Count one finished request under `outcome`.
pub fn record_request(outcome: &'static str) {
    counter!(REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_scenes(count: usize) {
    counter!(SCENES_TOTAL).increment(count as u64);
}

/// Tracks one running pipeline: raises the in-flight gauge on creation and
/// lowers it plus records the duration when dropped.
pub struct PipelineTimer {
    started: Instant,
}

impl PipelineTimer {
    pub fn start() -> Self {
        gauge!(PIPELINES_IN_FLIGHT).increment(1.0);
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for PipelineTimer {
    fn drop(&mut self) {
        gauge!(PIPELINES_IN_FLIGHT).decrement(1.0);
        histogram!(PIPELINE_DURATION).record(self.started.elapsed().as_secs_f64());
    }
}
