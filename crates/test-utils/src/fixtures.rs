//! Common test fixtures and test doubles.
//!
//! [`StaticCatalog`] and [`MemoryPixelSource`] stand in for the STAC API and
//! the COG reader so pipeline tests run without network access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use ndvi_common::{Band, BoundingBox, DateRange, Scene, SignedHref};
use raster_stack::{PixelSource, RasterError, RasterResult, SourceWindow};
use stac_client::{SceneCatalog, StacError, StacResult};

/// Common locations used across tests.
pub mod locations {
    /// Central Park, New York (lat, lon)
    pub const CENTRAL_PARK: (f64, f64) = (40.7812, -73.9665);

    /// Open Atlantic, where the catalog has no land scenes
    pub const OPEN_OCEAN: (f64, f64) = (30.0, -40.0);

    /// Iowa farmland
    pub const IOWA_FARM: (f64, f64) = (42.0, -93.5);
}

/// Noon UTC on the given day.
pub fn utc_day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid test date")
}

/// URL used by [`scene_with_all_bands`] for one band of a scene.
pub fn memory_url(scene_id: &str, band: Band) -> String {
    format!("mem://{}/{}", scene_id, band.asset_key())
}

/// A geographic scene carrying unsigned `mem://` references for every band.
pub fn scene_with_all_bands(id: &str, acquired: DateTime<Utc>) -> Scene {
    Band::ALL.iter().fold(
        Scene::new(id, "sentinel-2-l2a", acquired).with_epsg(4326),
        |scene, &band| scene.with_band(band, SignedHref::unsigned(memory_url(id, band))),
    )
}

/// A catalog returning the same scenes for every query.
pub struct StaticCatalog {
    scenes: Vec<Scene>,
    failure: Option<String>,
    calls: AtomicUsize,
    last_query: Mutex<Option<(BoundingBox, DateRange, f64)>>,
}

impl StaticCatalog {
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self {
            scenes,
            failure: None,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    /// A catalog with nothing in it.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// A catalog whose every search fails with an upstream error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::empty()
        }
    }

    /// Number of searches served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Arguments of the most recent search.
    pub fn last_query(&self) -> Option<(BoundingBox, DateRange, f64)> {
        self.last_query.lock().ok().and_then(|q| q.clone())
    }
}

#[async_trait]
impl SceneCatalog for StaticCatalog {
    async fn search(
        &self,
        bbox: &BoundingBox,
        range: &DateRange,
        cloud_cover_max: f64,
    ) -> StacResult<Vec<Scene>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_query.lock() {
            *last = Some((*bbox, *range, cloud_cover_max));
        }
        match &self.failure {
            Some(message) => Err(StacError::Status {
                context: "STAC search".into(),
                status: 502,
                body: message.clone(),
            }),
            None => Ok(self.scenes.clone()),
        }
    }

    fn collection(&self) -> &str {
        "sentinel-2-l2a"
    }
}

/// An in-memory pixel source keyed by href URL (query string ignored).
///
/// Unknown URLs fail with an invalid-TIFF error, so a test notices any read
/// it did not set up.
#[derive(Default)]
pub struct MemoryPixelSource {
    windows: HashMap<String, SourceWindow>,
    delay: Option<Duration>,
    reads: AtomicUsize,
}

impl MemoryPixelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `window` for `url`.
    pub fn with_window(mut self, url: impl Into<String>, window: SourceWindow) -> Self {
        self.windows.insert(url.into(), window);
        self
    }

    /// Serve a WGS84 window exactly covering `bbox` for `url`.
    pub fn with_grid(
        self,
        url: impl Into<String>,
        bbox: &BoundingBox,
        width: usize,
        height: usize,
        data: Vec<f32>,
    ) -> Self {
        self.with_window(url, geographic_window(bbox, width, height, data))
    }

    /// Sleep this long before answering each read.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of reads served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PixelSource for MemoryPixelSource {
    async fn read_window(
        &self,
        href: &SignedHref,
        _epsg_hint: Option<u32>,
        _bbox: &BoundingBox,
    ) -> RasterResult<SourceWindow> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let key = href.url.split('?').next().unwrap_or(&href.url);
        self.windows
            .get(key)
            .cloned()
            .ok_or_else(|| RasterError::invalid_tiff(format!("no in-memory raster for {}", key)))
    }
}

/// A WGS84 [`SourceWindow`] whose `width x height` cells exactly cover `bbox`.
pub fn geographic_window(bbox: &BoundingBox, width: usize, height: usize, data: Vec<f32>) -> SourceWindow {
    assert_eq!(data.len(), width * height, "window data length");
    SourceWindow {
        epsg: 4326,
        origin_x: bbox.min_lon,
        origin_y: bbox.max_lat,
        pixel_width: bbox.width() / width as f64,
        pixel_height: bbox.height() / height as f64,
        width,
        height,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_scene_with_all_bands() {
        let scene = scene_with_all_bands("S1", utc_day(2024, 5, 1));
        assert_eq!(scene.bands.len(), 4);
        assert_eq!(scene.band(Band::Nir).unwrap().url, "mem://S1/B08");
        assert_eq!(scene.epsg, Some(4326));
    }

    #[test]
    fn test_static_catalog_records_queries() {
        let catalog = StaticCatalog::new(vec![scene_with_all_bands("S1", utc_day(2024, 5, 1))]);
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let scenes = tokio_test::block_on(catalog.search(&bbox, &range(), 10.0)).unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(catalog.calls(), 1);
        let (b, _, cc) = catalog.last_query().unwrap();
        assert_eq!(b, bbox);
        assert_eq!(cc, 10.0);
    }

    #[test]
    fn test_failing_catalog() {
        let catalog = StaticCatalog::failing("boom");
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let err = tokio_test::block_on(catalog.search(&bbox, &range(), 10.0)).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_memory_source_ignores_query_string() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let source = MemoryPixelSource::new().with_grid("mem://a", &bbox, 1, 1, vec![7.0]);
        let href = SignedHref::unsigned("mem://a?sig=x");
        let window = tokio_test::block_on(source.read_window(&href, None, &bbox)).unwrap();
        assert_eq!(window.data, vec![7.0]);
        assert!(tokio_test::block_on(source.read_window(&SignedHref::unsigned("mem://b"), None, &bbox)).is_err());
        assert_eq!(source.reads(), 2);
    }
}
