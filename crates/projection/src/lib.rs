//! Coordinate reference system transformations.
//!
//! Implements the projections needed to sample scene rasters from scratch
//! without external dependencies: geographic WGS84 (EPSG:4326) and the WGS84
//! UTM zones (EPSG:326xx / 327xx).

pub mod utm;

pub use utm::Utm;

use ndvi_common::BoundingBox;
use thiserror::Error;

/// EPSG code of geographic WGS84.
pub const EPSG_WGS84: u32 = 4326;

#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    #[error("Unsupported CRS: EPSG:{0}")]
    UnsupportedEpsg(u32),

    #[error("Invalid UTM zone: {0}")]
    InvalidZone(u32),
}

/// A supported coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crs {
    /// Longitude/latitude in degrees
    Geographic,
    /// Easting/northing in meters
    Utm(Utm),
}

impl Crs {
    pub fn from_epsg(epsg: u32) -> Result<Self, ProjectionError> {
        if epsg == EPSG_WGS84 {
            return Ok(Crs::Geographic);
        }
        Utm::from_epsg(epsg)
            .map(Crs::Utm)
            .ok_or(ProjectionError::UnsupportedEpsg(epsg))
    }

    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Geographic => EPSG_WGS84,
            Crs::Utm(utm) => utm.epsg(),
        }
    }

    /// Project a WGS84 point `(lon, lat)` into this CRS.
    pub fn from_geographic(&self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Crs::Geographic => (lon, lat),
            Crs::Utm(utm) => utm.forward(lon, lat),
        }
    }

    /// Unproject a point in this CRS to WGS84 `(lon, lat)`.
    pub fn to_geographic(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Crs::Geographic => (x, y),
            Crs::Utm(utm) => utm.inverse(x, y),
        }
    }

    /// Envelope of a geographic bbox in this CRS.
    ///
    /// All four corners and edge midpoints are projected, which bounds the
    /// curvature of UTM grid lines for the small areas sampled here.
    pub fn project_bbox(&self, bbox: &BoundingBox) -> BoundingBox {
        if let Crs::Geographic = self {
            return *bbox;
        }
        let (cx, cy) = bbox.center();
        let samples = [
            (bbox.min_lon, bbox.min_lat),
            (bbox.min_lon, bbox.max_lat),
            (bbox.max_lon, bbox.min_lat),
            (bbox.max_lon, bbox.max_lat),
            (cx, bbox.min_lat),
            (cx, bbox.max_lat),
            (bbox.min_lon, cy),
            (bbox.max_lon, cy),
        ];

        let mut out = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (lon, lat) in samples {
            let (x, y) = self.from_geographic(lon, lat);
            out.min_lon = out.min_lon.min(x);
            out.min_lat = out.min_lat.min(y);
            out.max_lon = out.max_lon.max(x);
            out.max_lat = out.max_lat.max(y);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_epsg() {
        assert_eq!(Crs::from_epsg(4326).unwrap(), Crs::Geographic);
        assert_eq!(Crs::from_epsg(32618).unwrap().epsg(), 32618);
        assert_eq!(
            Crs::from_epsg(3857),
            Err(ProjectionError::UnsupportedEpsg(3857))
        );
    }

    #[test]
    fn test_geographic_is_identity() {
        let crs = Crs::Geographic;
        assert_eq!(crs.from_geographic(10.5, -3.25), (10.5, -3.25));
        let bbox = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(crs.project_bbox(&bbox), bbox);
    }

    #[test]
    fn test_project_bbox_to_utm() {
        let crs = Crs::from_epsg(32618).unwrap();
        let bbox = BoundingBox::around_point(-73.9665, 40.7812, 0.015);
        let out = crs.project_bbox(&bbox);
        // 0.03 deg of longitude at 40.8N is about 2.5 km, of latitude 3.3 km
        assert!(out.width() > 2_300.0 && out.width() < 2_800.0);
        assert!(out.height() > 3_200.0 && out.height() < 3_500.0);
        assert!(out.min_lon > 500_000.0);
    }
}
