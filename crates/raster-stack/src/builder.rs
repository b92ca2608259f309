//! Cube assembly: fetch every (scene, band) window and align it onto one grid.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument};

use ndvi_common::{Band, BoundingBox, Scene, SignedHref};

use crate::cube::RasterCube;
use crate::error::{RasterError, RasterResult};
use crate::grid::{TargetGrid, DEFAULT_RESOLUTION_DEG};
use crate::resample::{resample_nearest, ProjectedCenters};
use crate::source::{PixelSource, SourceWindow};

/// Tuning for [`RasterStack`].
#[derive(Debug, Clone)]
pub struct StackOptions {
    /// Band reads in flight per cube
    pub fetch_concurrency: usize,
    /// Target cell size in degrees
    pub resolution: f64,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            fetch_concurrency: 8,
            resolution: DEFAULT_RESOLUTION_DEG,
        }
    }
}

/// Builds [`RasterCube`]s from catalog scenes.
#[derive(Clone)]
pub struct RasterStack {
    source: Arc<dyn PixelSource>,
    options: StackOptions,
}

struct ReadJob<'a> {
    t: usize,
    band: Band,
    scene: &'a Scene,
    href: &'a SignedHref,
}

impl RasterStack {
    pub fn new(source: Arc<dyn PixelSource>, options: StackOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &StackOptions {
        &self.options
    }

    /// Assemble a cube of `bands` over `bbox`, one time slice per scene.
    ///
    /// Slices are ordered by acquisition time; scenes acquired at the same
    /// instant keep their input order. A band a scene does not carry stays
    /// NaN for that slice. Any failed read aborts the whole build.
    #[instrument(skip_all, fields(scenes = scenes.len(), bands = bands.len()))]
    pub async fn build(
        &self,
        scenes: &[Scene],
        bands: &[Band],
        bbox: &BoundingBox,
    ) -> RasterResult<RasterCube> {
        self.build_at(scenes, bands, bbox, Utc::now()).await
    }

    /// [`build`](Self::build) with an explicit clock for expiry checks.
    pub async fn build_at(
        &self,
        scenes: &[Scene],
        bands: &[Band],
        bbox: &BoundingBox,
        now: DateTime<Utc>,
    ) -> RasterResult<RasterCube> {
        let grid = TargetGrid::new(*bbox, self.options.resolution)?;

        let mut ordered: Vec<&Scene> = scenes.iter().collect();
        ordered.sort_by_key(|s| s.acquired);

        let mut jobs = Vec::new();
        for (t, &scene) in ordered.iter().enumerate() {
            for &band in bands {
                let Some(href) = scene.band(band) else {
                    debug!(scene = %scene.id, band = %band, "Band missing from scene");
                    continue;
                };
                if href.is_expired(now) {
                    return Err(RasterError::ExpiredHref {
                        scene: scene.id.clone(),
                        band: band.to_string(),
                        expired_at: href
                            .expires_at
                            .map(|e| e.to_rfc3339())
                            .unwrap_or_default(),
                    });
                }
                jobs.push(ReadJob {
                    t,
                    band,
                    scene,
                    href,
                });
            }
        }

        let job_count = jobs.len();
        let windows: Vec<(usize, Band, SourceWindow)> = stream::iter(jobs)
            .map(|job| {
                let source = Arc::clone(&self.source);
                async move {
                    let window = source
                        .read_window(job.href, job.scene.epsg, bbox)
                        .await
                        .map_err(|e| e.in_scene(&job.scene.id, job.band.name()))?;
                    Ok::<_, RasterError>((job.t, job.band, window))
                }
            })
            .buffer_unordered(self.options.fetch_concurrency.max(1))
            .try_collect()
            .await?;

        let times = ordered.iter().map(|s| s.acquired).collect();
        let ids = ordered.iter().map(|s| s.id.clone()).collect();
        let mut cube = RasterCube::new_nan(bands.to_vec(), times, ids, grid.clone());

        let mut centers: HashMap<u32, ProjectedCenters> = HashMap::new();
        for (t, band, window) in windows {
            if window.width == 0 || window.height == 0 {
                continue;
            }
            if !centers.contains_key(&window.epsg) {
                centers.insert(window.epsg, ProjectedCenters::new(&grid, window.epsg)?);
            }
            let projected = &centers[&window.epsg];
            if let Some(slice) = cube.slice_mut(band, t) {
                resample_nearest(&window, projected, slice);
            }
        }

        info!(
            slices = cube.n_times(),
            reads = job_count,
            width = grid.width,
            height = grid.height,
            "Built raster cube"
        );
        Ok(cube)
    }
}
