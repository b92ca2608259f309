//! Index heatmaps on the RdYlGn scale, with a color-bar legend.

use image::RgbaImage;

use crate::colormap::{rdylgn_lut, Color, ValueScale, LUT_SIZE};
use crate::encode::EncodedImage;
use crate::error::{RenderError, RenderResult};
use crate::legend::{draw_legend, legend_width};
use crate::png::create_png_auto;

/// RGBA pixels of `values` colorized over `scale`. NaN pixels are
/// transparent.
pub fn heatmap_pixels(
    values: &[f32],
    width: usize,
    height: usize,
    scale: ValueScale,
) -> RenderResult<Vec<u8>> {
    RenderError::check_size(width, height, values.len())?;
    let lut = rdylgn_lut();
    let mut pixels = vec![0u8; width * height * 4];
    for (px, &v) in pixels.chunks_exact_mut(4).zip(values) {
        let color = if v.is_nan() {
            Color::transparent()
        } else {
            lut[(scale.normalize(v) * (LUT_SIZE - 1) as f32).round() as usize]
        };
        px.copy_from_slice(&color.to_array());
    }
    Ok(pixels)
}

/// Map plus legend as one RGBA canvas, map on the left.
pub fn heatmap_canvas(
    values: &[f32],
    width: usize,
    height: usize,
    scale: ValueScale,
) -> RenderResult<RgbaImage> {
    let map = heatmap_pixels(values, width, height, scale)?;
    let map = RgbaImage::from_raw(width as u32, height as u32, map).ok_or_else(|| {
        RenderError::Encode(format!("{}x{} map buffer has the wrong length", width, height))
    })?;

    let mut canvas = RgbaImage::new(width as u32 + legend_width(scale), height as u32);
    image::imageops::replace(&mut canvas, &map, 0, 0);
    draw_legend(&mut canvas, width as u32, scale);
    Ok(canvas)
}

/// Render and PNG-encode the heatmap of one index slice.
///
/// The color scale spans the slice's own finite values, or [-1, 1] when it
/// has none.
pub fn render_heatmap(values: &[f32], width: usize, height: usize) -> RenderResult<EncodedImage> {
    let scale = ValueScale::autoscale(values);
    let canvas = heatmap_canvas(values, width, height, scale)?;
    let (w, h) = canvas.dimensions();
    let png = create_png_auto(canvas.as_raw(), w as usize, h as usize)?;
    Ok(EncodedImage::new(w, h, png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::rdylgn;

    #[test]
    fn test_extremes_map_to_scale_ends() {
        let px = heatmap_pixels(&[0.0, 1.0, f32::NAN], 3, 1, ValueScale::new(0.0, 1.0)).unwrap();
        assert_eq!(&px[0..4], &rdylgn(0.0).to_array());
        assert_eq!(&px[4..8], &rdylgn(1.0).to_array());
        assert_eq!(&px[8..12], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_canvas_has_legend_panel() {
        let scale = ValueScale::new(0.1, 0.4);
        let canvas = heatmap_canvas(&[0.1, 0.4, 0.2, 0.3], 2, 2, scale).unwrap();
        assert_eq!(canvas.width(), 2 + legend_width(scale));
        assert_eq!(canvas.height(), 2);
        assert_eq!(canvas.get_pixel(0, 0).0, rdylgn(0.0).to_array());
    }

    #[test]
    fn test_render_heatmap_all_nan_uses_fallback() {
        let img = render_heatmap(&[f32::NAN; 16], 4, 4).unwrap();
        assert_eq!(img.width, 4 + legend_width(ValueScale::FALLBACK));
        assert!(!img.is_empty());
    }
}
