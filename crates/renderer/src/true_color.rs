//! Natural-color composites from red, green and blue reflectance.

use crate::encode::EncodedImage;
use crate::error::{RenderError, RenderResult};
use crate::png::create_png_auto;

/// Reflectance mapped to full brightness; brighter values saturate.
pub const REFLECTANCE_MAX: f32 = 3000.0;

/// Clip to [0, REFLECTANCE_MAX], rescale to [0, 1] and quantize to 8 bits.
#[inline]
pub fn to_channel(value: f32) -> u8 {
    (value.clamp(0.0, REFLECTANCE_MAX) / REFLECTANCE_MAX * 255.0).round() as u8
}

/// RGBA pixels of a true-color composite. Pixels with any NaN channel are
/// fully transparent.
pub fn true_color_pixels(
    red: &[f32],
    green: &[f32],
    blue: &[f32],
    width: usize,
    height: usize,
) -> RenderResult<Vec<u8>> {
    for band in [red, green, blue] {
        RenderError::check_size(width, height, band.len())?;
    }
    let mut pixels = vec![0u8; width * height * 4];
    for (i, px) in pixels.chunks_exact_mut(4).enumerate() {
        let (r, g, b) = (red[i], green[i], blue[i]);
        if r.is_nan() || g.is_nan() || b.is_nan() {
            continue;
        }
        px.copy_from_slice(&[to_channel(r), to_channel(g), to_channel(b), 255]);
    }
    Ok(pixels)
}

/// Render and PNG-encode a true-color composite.
pub fn render_true_color(
    red: &[f32],
    green: &[f32],
    blue: &[f32],
    width: usize,
    height: usize,
) -> RenderResult<EncodedImage> {
    let pixels = true_color_pixels(red, green, blue, width, height)?;
    let png = create_png_auto(&pixels, width, height)?;
    Ok(EncodedImage::new(width as u32, height as u32, png))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_clipping() {
        assert_eq!(to_channel(-50.0), 0);
        assert_eq!(to_channel(0.0), 0);
        assert_eq!(to_channel(1500.0), 128);
        assert_eq!(to_channel(3000.0), 255);
        assert_eq!(to_channel(9000.0), 255);
    }

    #[test]
    fn test_nan_pixel_transparent() {
        let px = true_color_pixels(&[3000.0, 100.0], &[0.0, f32::NAN], &[1500.0, 100.0], 2, 1).unwrap();
        assert_eq!(&px[0..4], &[255, 0, 128, 255]);
        assert_eq!(&px[4..8], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_band_length_checked() {
        assert!(true_color_pixels(&[0.0], &[0.0, 0.0], &[0.0], 1, 1).is_err());
    }
}
