//! Application state and shared resources.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use ndvi_common::{PipelineError, PipelineResult};

use crate::config::ServerConfig;
use crate::pipeline::Pipeline;

/// Shared application state.
pub struct AppState {
    pub pipeline: Pipeline,
    /// Bounds the number of pipelines running at once
    limiter: Arc<Semaphore>,
    queue_timeout: Duration,
    /// Absent when no global recorder was installed (tests)
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, max_concurrent: usize, queue_timeout: Duration) -> Self {
        Self {
            pipeline,
            limiter: Arc::new(Semaphore::new(max_concurrent.max(1))),
            queue_timeout,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Build state with the live catalog and COG reader.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let pipeline = config.upstream.build_pipeline()?;
        Ok(Self::new(
            pipeline,
            config.max_concurrent_pipelines,
            config.queue_timeout(),
        ))
    }

    /// Wait for a pipeline slot, giving up after the queue timeout.
    pub async fn acquire_slot(&self) -> PipelineResult<OwnedSemaphorePermit> {
        match tokio::time::timeout(self.queue_timeout, self.limiter.clone().acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(PipelineError::Overloaded("pipeline limiter closed".into())),
            Err(_) => Err(PipelineError::Overloaded(format!(
                "no pipeline slot free after {}s",
                self.queue_timeout.as_secs_f64()
            ))),
        }
    }
}
