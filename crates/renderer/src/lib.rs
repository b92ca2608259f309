//! Frame rendering for vegetation timelapses.
//!
//! Implements two image kinds per acquisition:
//! - True-color composites from red, green and blue reflectance
//! - Index heatmaps on a diverging red-yellow-green scale with a legend
//!
//! All functions are pure and allocate their own buffers, so slices can be
//! rendered concurrently.

pub mod colormap;
pub mod encode;
pub mod error;
pub mod frame;
pub mod heatmap;
pub mod legend;
pub mod png;
pub mod true_color;

pub use colormap::{rdylgn, Color, ValueScale};
pub use encode::EncodedImage;
pub use error::{RenderError, RenderResult};
pub use frame::{render_frame, render_frames, Frame};
pub use heatmap::render_heatmap;
pub use true_color::render_true_color;
