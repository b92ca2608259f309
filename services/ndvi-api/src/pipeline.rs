//! End-to-end orchestration: catalog search, cube assembly, index,
//! aggregation and rendering for one point query.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, instrument};

use ndvi_common::{Band, PipelineError, PipelineResult, Query, DEFAULT_CLOUD_COVER_MAX};
use raster_stack::{RasterCube, RasterStack};
use renderer::{render_frames, Frame};
use spectral::{ndvi, reduce, TimeSeriesPoint};
use stac_client::SceneCatalog;

use crate::metrics::{record_scenes, PipelineTimer};

/// Bands every cube is built with: the index pair plus true color.
pub const CUBE_BANDS: [Band; 4] = [Band::Nir, Band::Red, Band::Green, Band::Blue];

/// Series and frames for one query, both in time order.
#[derive(Debug, Clone)]
pub struct Timelapse {
    pub series: Vec<TimeSeriesPoint>,
    pub frames: Vec<Frame>,
}

/// What a pipeline run produced.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Data(Timelapse),
    /// The catalog had no scenes for the area and window.
    NoData,
}

impl PipelineOutcome {
    /// The timelapse, with [`PipelineError::NotFound`] for no data.
    pub fn into_result(self) -> PipelineResult<Timelapse> {
        match self {
            PipelineOutcome::Data(timelapse) => Ok(timelapse),
            PipelineOutcome::NoData => Err(PipelineError::NotFound),
        }
    }
}

/// Runs queries against a catalog and a raster stack.
///
/// Holds no per-request state; clones share the catalog client.
#[derive(Clone)]
pub struct Pipeline {
    catalog: Arc<dyn SceneCatalog>,
    stack: RasterStack,
    cloud_cover_max: f64,
}

impl Pipeline {
    pub fn new(catalog: Arc<dyn SceneCatalog>, stack: RasterStack) -> Self {
        Self {
            catalog,
            stack,
            cloud_cover_max: DEFAULT_CLOUD_COVER_MAX,
        }
    }

    pub fn with_cloud_cover_max(mut self, max: f64) -> PipelineResult<Self> {
        if !(0.0..=100.0).contains(&max) {
            return Err(PipelineError::invalid_parameter(
                "cloud_cover_max",
                format!("{} is outside [0, 100]", max),
            ));
        }
        self.cloud_cover_max = max;
        Ok(self)
    }

    pub fn cloud_cover_max(&self) -> f64 {
        self.cloud_cover_max
    }

    /// Index history and frames around `(lat, lon)`.
    ///
    /// A missing end date means today (UTC); a missing start date means one
    /// year before the end.
    pub async fn get_index_timeseries(
        &self,
        lat: f64,
        lon: f64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> PipelineResult<PipelineOutcome> {
        let query = Query::with_defaults(lat, lon, start, end, Utc::now().date_naive())?
            .with_cloud_cover_max(self.cloud_cover_max)?;
        self.run(&query).await
    }

    /// Run a validated query.
    #[instrument(skip_all, fields(lat = query.lat(), lon = query.lon(), start = %query.date_range().start, end = %query.date_range().end))]
    pub async fn run(&self, query: &Query) -> PipelineResult<PipelineOutcome> {
        let timer = PipelineTimer::start();
        let bbox = query.bbox();

        let scenes = self
            .catalog
            .search(&bbox, &query.date_range(), query.cloud_cover_max())
            .await?;
        record_scenes(scenes.len());
        if scenes.is_empty() {
            info!("No scenes matched");
            return Ok(PipelineOutcome::NoData);
        }

        let cube = self.stack.build(&scenes, &CUBE_BANDS, &bbox).await?;
        let timelapse = tokio::task::spawn_blocking(move || summarize(&cube))
            .await
            .map_err(|e| PipelineError::upstream(format!("render task failed: {}", e)))??;

        info!(
            scenes = scenes.len(),
            points = timelapse.series.len(),
            frames = timelapse.frames.len(),
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "Pipeline complete"
        );
        Ok(PipelineOutcome::Data(timelapse))
    }
}

/// CPU phase over an assembled cube.
fn summarize(cube: &RasterCube) -> PipelineResult<Timelapse> {
    let layer = ndvi(cube)?;
    let series = reduce(&layer);
    let frames = render_frames(cube, &layer)?;
    Ok(Timelapse { series, frames })
}
