//! Timeseries request payloads and their validation.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use ndvi_common::time::parse_date;
use ndvi_common::{PipelineError, PipelineResult, Query};

/// Body of `POST /api/timeseries`.
///
/// Coordinates are accepted as JSON numbers or numeric strings; `null`
/// counts as missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeseriesRequest {
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lon: Option<Value>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl TimeseriesRequest {
    /// Validate into a [`Query`], resolving absent dates relative to `today`.
    pub fn into_query(self, today: NaiveDate, cloud_cover_max: f64) -> PipelineResult<Query> {
        let (lat, lon) = match (present(self.lat), present(self.lon)) {
            (Some(lat), Some(lon)) => (coordinate("lat", lat)?, coordinate("lon", lon)?),
            _ => return Err(PipelineError::MissingCoordinates),
        };
        let start = optional_date(self.start_date)?;
        let end = optional_date(self.end_date)?;
        Query::with_defaults(lat, lon, start, end, today)?.with_cloud_cover_max(cloud_cover_max)
    }
}

fn present(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

fn coordinate(name: &str, value: Value) -> PipelineResult<f64> {
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| PipelineError::invalid_parameter(name, format!("{} is not a number", value)))
}

/// Empty strings are treated like an absent date.
fn optional_date(value: Option<String>) -> PipelineResult<Option<NaiveDate>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Ok(Some(parse_date(s)?)),
    }
}
