//! One rendered frame per cube time slice.

use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use tracing::debug;

use ndvi_common::Band;
use raster_stack::RasterCube;
use spectral::IndexLayer;

use crate::encode::EncodedImage;
use crate::error::{RenderError, RenderResult};
use crate::heatmap::render_heatmap;
use crate::true_color::render_true_color;

/// The images of one acquisition.
#[derive(Debug, Clone)]
pub struct Frame {
    pub acquired: DateTime<Utc>,
    pub true_color: EncodedImage,
    pub heatmap: EncodedImage,
}

impl Frame {
    pub fn date(&self) -> NaiveDate {
        self.acquired.date_naive()
    }
}

/// Render slice `t` of `cube` and its index layer.
pub fn render_frame(cube: &RasterCube, index: &IndexLayer, t: usize) -> RenderResult<Frame> {
    let band = |b: Band| cube.slice(b, t).ok_or(RenderError::MissingBand(b));
    let (w, h) = (cube.width(), cube.height());

    let true_color = render_true_color(band(Band::Red)?, band(Band::Green)?, band(Band::Blue)?, w, h)?;
    let values = index.slice(t).ok_or(RenderError::MissingIndexSlice(t))?;
    let heatmap = render_heatmap(values, index.width(), index.height())?;

    Ok(Frame {
        acquired: cube.times()[t],
        true_color,
        heatmap,
    })
}

/// Render every time slice in parallel, in time order.
///
/// Slices with no valid index pixels still get a frame.
pub fn render_frames(cube: &RasterCube, index: &IndexLayer) -> RenderResult<Vec<Frame>> {
    let frames = (0..cube.n_times())
        .into_par_iter()
        .map(|t| render_frame(cube, index, t))
        .collect::<RenderResult<Vec<_>>>()?;
    debug!(frames = frames.len(), "Rendered frames");
    Ok(frames)
}
