//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser};

use ndvi_common::DEFAULT_CLOUD_COVER_MAX;
use raster_stack::{CogOptions, CogPixelSource, RasterStack, StackOptions};
use stac_client::{RetryPolicy, StacCatalogClient, StacClientOptions, DEFAULT_COLLECTION, PC_SAS_URL, PC_STAC_URL};

use crate::pipeline::Pipeline;

/// Settings for the catalog and imagery endpoints, shared by the server and
/// the probe.
#[derive(Args, Debug, Clone)]
pub struct UpstreamConfig {
    /// STAC API root
    #[arg(long, env = "STAC_API_URL", default_value = PC_STAC_URL)]
    pub stac_url: String,

    /// SAS token API root; empty leaves asset URLs unsigned
    #[arg(long, env = "PC_SAS_URL", default_value = PC_SAS_URL)]
    pub sas_url: String,

    /// STAC collection to search
    #[arg(long, env = "STAC_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Scenes with cloud cover at or above this percentage are skipped
    #[arg(long, env = "CLOUD_COVER_MAX", default_value_t = DEFAULT_CLOUD_COVER_MAX)]
    pub cloud_cover_max: f64,

    /// Timeout for each outbound HTTP request, in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Retries after a failed outbound request
    #[arg(long, env = "UPSTREAM_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Band rasters read concurrently per request
    #[arg(long, env = "FETCH_CONCURRENCY", default_value_t = 8)]
    pub fetch_concurrency: usize,
}

impl UpstreamConfig {
    fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            ..RetryPolicy::default()
        }
    }

    pub fn stac_options(&self) -> StacClientOptions {
        let sas_url = self.sas_url.trim();
        StacClientOptions {
            stac_url: self.stac_url.clone(),
            sas_url: (!sas_url.is_empty()).then(|| sas_url.to_string()),
            collection: self.collection.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            retry: self.retry(),
            ..StacClientOptions::default()
        }
    }

    pub fn cog_options(&self) -> CogOptions {
        CogOptions {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            retry: self.retry(),
            ..CogOptions::default()
        }
    }

    pub fn stack_options(&self) -> StackOptions {
        StackOptions {
            fetch_concurrency: self.fetch_concurrency.max(1),
            ..StackOptions::default()
        }
    }

    /// Wire the live catalog and COG reader into a pipeline.
    pub fn build_pipeline(&self) -> Result<Pipeline> {
        let catalog = StacCatalogClient::new(self.stac_options()).context("building STAC client")?;
        let source = CogPixelSource::new(self.cog_options()).context("building COG reader")?;
        let stack = RasterStack::new(Arc::new(source), self.stack_options());
        Pipeline::new(Arc::new(catalog), stack)
            .with_cloud_cover_max(self.cloud_cover_max)
            .context("invalid --cloud-cover-max")
    }
}

/// Vegetation timelapse API server
#[derive(Parser, Debug, Clone)]
#[command(name = "ndvi-api")]
#[command(about = "Vegetation index time series and timelapse frames over HTTP")]
pub struct ServerConfig {
    /// Listen address
    #[arg(short, long, env = "NDVI_LISTEN_ADDR", default_value = "0.0.0.0:5002")]
    pub listen: String,

    /// Port override for the listen address
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Log level
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Pipelines allowed to run at once
    #[arg(long, env = "MAX_CONCURRENT_PIPELINES", default_value_t = 4)]
    pub max_concurrent_pipelines: usize,

    /// Seconds a request may wait for a pipeline slot before a 503
    #[arg(long, env = "QUEUE_TIMEOUT_SECS", default_value_t = 30)]
    pub queue_timeout_secs: u64,

    #[command(flatten)]
    pub upstream: UpstreamConfig,
}

impl ServerConfig {
    /// Socket address to bind, with `--port` replacing the port of `--listen`.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let mut addr: SocketAddr = self
            .listen
            .parse()
            .with_context(|| format!("invalid listen address '{}'", self.listen))?;
        if let Some(port) = self.port {
            addr.set_port(port);
        }
        Ok(addr)
    }

    pub fn queue_timeout(&self) -> Duration {
        Duration::from_secs(self.queue_timeout_secs)
    }
}
