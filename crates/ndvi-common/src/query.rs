//! Validated point queries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::error::{PipelineError, PipelineResult};
use crate::time::DateRange;

/// Half-width of the area searched around the query point, in degrees.
pub const POINT_BUFFER_DEG: f64 = 0.015;

/// Scenes at or above this cloud percentage are excluded.
pub const DEFAULT_CLOUD_COVER_MAX: f64 = 10.0;

/// A validated request for one point's index history.
///
/// Only constructed through [`Query::new`], so coordinates and dates are
/// always within range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    lat: f64,
    lon: f64,
    date_range: DateRange,
    cloud_cover_max: f64,
    buffer: f64,
}

impl Query {
    pub fn new(lat: f64, lon: f64, date_range: DateRange) -> PipelineResult<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(PipelineError::invalid_parameter(
                "lat",
                format!("{} is outside [-90, 90]", lat),
            ));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(PipelineError::invalid_parameter(
                "lon",
                format!("{} is outside [-180, 180]", lon),
            ));
        }
        Ok(Self {
            lat,
            lon,
            date_range,
            cloud_cover_max: DEFAULT_CLOUD_COVER_MAX,
            buffer: POINT_BUFFER_DEG,
        })
    }

    /// Build a query from optional dates, applying the default window
    /// relative to `today`.
    pub fn with_defaults(
        lat: f64,
        lon: f64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> PipelineResult<Self> {
        let range = DateRange::resolve(start, end, today)?;
        Self::new(lat, lon, range)
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

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    pub fn cloud_cover_max(&self) -> f64 {
        self.cloud_cover_max
    }

    /// Search area: the point buffered by [`POINT_BUFFER_DEG`] on every side.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::around_point(self.lon, self.lat, self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_bbox_is_buffered_point() {
        let q = Query::with_defaults(40.7812, -73.9665, None, None, today()).unwrap();
        let bbox = q.bbox();
        assert!((bbox.min_lon - (-73.9665 - 0.015)).abs() < 1e-12);
        assert!((bbox.min_lat - (40.7812 - 0.015)).abs() < 1e-12);
        assert!((bbox.max_lon - (-73.9665 + 0.015)).abs() < 1e-12);
        assert!((bbox.max_lat - (40.7812 + 0.015)).abs() < 1e-12);
        assert_eq!(q.cloud_cover_max(), 10.0);
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        assert!(Query::with_defaults(91.0, 0.0, None, None, today()).is_err());
        assert!(Query::with_defaults(0.0, -180.5, None, None, today()).is_err());
        assert!(Query::with_defaults(f64::NAN, 0.0, None, None, today()).is_err());
    }

    #[test]
    fn test_cloud_cover_bounds() {
        let q = Query::with_defaults(0.0, 0.0, None, None, today()).unwrap();
        assert!(q.clone().with_cloud_cover_max(25.0).is_ok());
        assert!(q.with_cloud_cover_max(150.0).is_err());
    }
}
