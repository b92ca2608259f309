//! `POST /api/timeseries`.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use renderer::Frame;
use spectral::TimeSeriesPoint;

use crate::error::ApiError;
use crate::metrics::record_request;
use crate::request::TimeseriesRequest;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SeriesEntry {
    pub date: NaiveDate,
    pub ndvi: f64,
}

impl From<&TimeSeriesPoint> for SeriesEntry {
    fn from(point: &TimeSeriesPoint) -> Self {
        Self {
            date: point.date,
            ndvi: point.value,
        }
    }
}

/// One timelapse frame as base64 PNGs.
#[derive(Debug, Serialize)]
pub struct FrameEntry {
    pub date: NaiveDate,
    /// True-color composite
    pub rgb: String,
    /// Index heatmap with legend
    pub mask: String,
}

impl From<&Frame> for FrameEntry {
    fn from(frame: &Frame) -> Self {
        Self {
            date: frame.date(),
            rgb: frame.true_color.to_base64(),
            mask: frame.heatmap.to_base64(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TimeseriesResponse {
    pub status: &'static str,
    pub data: Vec<SeriesEntry>,
    pub frames: Vec<FrameEntry>,
}

#[instrument(skip_all)]
pub async fn timeseries_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<TimeseriesRequest>, JsonRejection>,
) -> Result<Json<TimeseriesResponse>, ApiError> {
    let result = run(&state, payload).await;
    match &result {
        Ok(_) => record_request("success"),
        Err(err) => record_request(err.0.outcome_label()),
    }
    result
}

async fn run(
    state: &AppState,
    payload: Result<Json<TimeseriesRequest>, JsonRejection>,
) -> Result<Json<TimeseriesResponse>, ApiError> {
    let Json(request) = payload?;
    let query = request.into_query(Utc::now().date_naive(), state.pipeline.cloud_cover_max())?;
    info!(lat = query.lat(), lon = query.lon(), range = %query.date_range().to_stac_interval(), "Timeseries request");

    let _permit = state.acquire_slot().await?;
    let timelapse = state.pipeline.run(&query).await?.into_result()?;

    Ok(Json(TimeseriesResponse {
        status: "success",
        data: timelapse.series.iter().map(SeriesEntry::from).collect(),
        frames: timelapse.frames.iter().map(FrameEntry::from).collect(),
    }))
}
