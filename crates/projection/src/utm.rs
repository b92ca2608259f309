//! Universal Transverse Mercator projection on the WGS84 ellipsoid.
//!
//! Sentinel-2 L2A rasters are delivered in the UTM zone of their tile
//! (EPSG 326xx for the northern hemisphere, 327xx for the southern). The
//! series expansions follow Snyder, *Map Projections: A Working Manual*
//! (USGS Professional Paper 1395), pp. 61-64, and are accurate to well
//! under a metre within a zone.

use crate::ProjectionError;

/// WGS84 semi-major axis (meters)
const A: f64 = 6_378_137.0;
/// WGS84 flattening
const F: f64 = 1.0 / 298.257_223_563;
/// First eccentricity squared
const E2: f64 = 2.0 * F - F * F;
/// Second eccentricity squared
const EP2: f64 = E2 / (1.0 - E2);
/// Scale factor on the central meridian
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// A single UTM zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Utm {
    /// Zone number, 1..=60
    pub zone: u32,
    /// Northern hemisphere (no false northing)
    pub north: bool,
    /// Central meridian in radians
    lon0: f64,
}

impl Utm {
    /// Create a projection for `zone` (1..=60) in the given hemisphere.
    pub fn new(zone: u32, north: bool) -> Result<Self, ProjectionError> {
        if !(1..=60).contains(&zone) {
            return Err(ProjectionError::InvalidZone(zone));
        }
        let lon0 = ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians();
        Ok(Self { zone, north, lon0 })
    }

    /// Interpret an EPSG code as a WGS84 UTM zone.
    ///
    /// - 32601..=32660 → zone 1..60 north
    /// - 32701..=32760 → zone 1..60 south
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        let (zone, north) = if (32601..=32660).contains(&epsg) {
            (epsg - 32600, true)
        } else if (32701..=32760).contains(&epsg) {
            (epsg - 32700, false)
        } else {
            return None;
        };
        Self::new(zone, north).ok()
    }

    /// Zone containing a longitude, ignoring the Norway/Svalbard exceptions.
    pub fn zone_for(lon_deg: f64, lat_deg: f64) -> Self {
        let lon = ((lon_deg + 180.0).rem_euclid(360.0)) - 180.0;
        let zone = (((lon + 180.0) / 6.0).floor() as u32 + 1).min(60);
        // Zone is always 1..=60 here.
        let lon0 = ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians();
        Self {
            zone,
            north: lat_deg >= 0.0,
            lon0,
        }
    }

    pub fn epsg(&self) -> u32 {
        if self.north {
            32600 + self.zone
        } else {
            32700 + self.zone
        }
    }

    /// Central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        self.lon0.to_degrees()
    }

    /// Project geographic degrees to `(easting, northing)` meters.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let mut dlon = lon_deg.to_radians() - self.lon0;
        let pi = std::f64::consts::PI;
        while dlon > pi {
            dlon -= 2.0 * pi;
        }
        while dlon < -pi {
            dlon += 2.0 * pi;
        }

        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let tan_lat = lat.tan();

        let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
        let t = tan_lat * tan_lat;
        let c = EP2 * cos_lat * cos_lat;
        let a = cos_lat * dlon;
        let m = meridional_arc(lat);

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a2 * a2;
        let a5 = a4 * a;
        let a6 = a4 * a2;

        // Snyder 8-9
        let easting = K0
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * EP2) * a5 / 120.0)
            + FALSE_EASTING;

        // Snyder 8-10
        let mut northing = K0
            * (m + n
                * tan_lat
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * EP2) * a6 / 720.0));
        if !self.north {
            northing += FALSE_NORTHING_SOUTH;
        }

        (easting, northing)
    }

    /// Unproject `(easting, northing)` meters to `(lon, lat)` degrees.
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let x = easting - FALSE_EASTING;
        let y = if self.north {
            northing
        } else {
            northing - FALSE_NORTHING_SOUTH
        };

        let e4 = E2 * E2;
        let e6 = e4 * E2;
        let m = y / K0;
        let mu = m / (A * (1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

        let sqrt_1me2 = (1.0 - E2).sqrt();
        let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);
        let e1_2 = e1 * e1;
        let e1_3 = e1_2 * e1;
        let e1_4 = e1_3 * e1;

        // Footpoint latitude, Snyder 3-26
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let tan_phi1 = phi1.tan();

        let c1 = EP2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let denom = 1.0 - E2 * sin_phi1 * sin_phi1;
        let n1 = A / denom.sqrt();
        let r1 = A * (1.0 - E2) / denom.powf(1.5);
        let d = x / (n1 * K0);

        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d2 * d2;
        let d5 = d4 * d;
        let d6 = d4 * d2;

        // Snyder 8-17
        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * EP2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * EP2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);

        // Snyder 8-18
        let lon = self.lon0
            + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * EP2 + 24.0 * t1 * t1)
                    * d5
                    / 120.0)
                / cos_phi1;

        (lon.to_degrees(), lat.to_degrees())
    }
}

/// Meridional arc length from the equator, Snyder 3-21.
fn meridional_arc(lat: f64) -> f64 {
    let e4 = E2 * E2;
    let e6 = e4 * E2;

    A * ((1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * E2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}
