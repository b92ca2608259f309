//! One-shot pipeline run against the live catalog.
//!
//! Usage:
//!   ndvi-probe --lat 40.7812 --lon -73.9665
//!   ndvi-probe --lat 41.9 --lon -93.6 --start-date 2024-05-01 --end-date 2024-09-30

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use ndvi_api::config::UpstreamConfig;
use ndvi_api::PipelineOutcome;

#[derive(Parser, Debug)]
#[command(name = "ndvi-probe")]
#[command(about = "Fetch one vegetation timelapse and print a summary")]
struct Args {
    /// Latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// First day (YYYY-MM-DD); defaults to one year before the end
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD); defaults to today
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Log level
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    log_level: String,

    #[command(flatten)]
    upstream: UpstreamConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt().with_env_filter(filter).init();

    println!("Testing data fetch for {}, {}...", args.lat, args.lon);
    let pipeline = args.upstream.build_pipeline()?;
    let outcome = pipeline
        .get_index_timeseries(args.lat, args.lon, args.start_date, args.end_date)
        .await?;

    let timelapse = match outcome {
        PipelineOutcome::Data(timelapse) => timelapse,
        PipelineOutcome::NoData => bail!("No data found for this location"),
    };

    println!("Time series length: {}", timelapse.series.len());
    println!("Frames generated: {}", timelapse.frames.len());
    if let Some(last) = timelapse.frames.last() {
        println!("Latest date: {}", last.date());
    }
    Ok(())
}
