//! Vegetation Timelapse API Server
//!
//! Serves index time series and timelapse frames for point queries.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ndvi_api::config::ServerConfig;
use ndvi_api::{build_router, metrics, AppState};

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = ServerConfig::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_server(config))
}

async fn run_server(config: ServerConfig) -> Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let prometheus = metrics::install_recorder()?;
    info!("Prometheus metrics exporter initialized");
    info!(
        stac_url = %config.upstream.stac_url,
        collection = %config.upstream.collection,
        max_concurrent = config.max_concurrent_pipelines,
        "Starting vegetation timelapse API server"
    );

    let state = Arc::new(AppState::from_config(&config)?.with_prometheus(prometheus));
    let app = build_router(state);

    let addr = config.listen_addr()?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
