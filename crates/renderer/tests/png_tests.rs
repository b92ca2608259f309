//! Tests for PNG encoding functionality.
//!
//! Encoded images are decoded again with the `image` crate to check they
//! are valid PNGs carrying the original pixels.

use renderer::png::{create_png, create_png_auto, PNG_SIGNATURE};

// ============================================================================
// Helper functions
// ============================================================================

fn decode(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory_with_format(png, image::ImageFormat::Png)
        .expect("valid PNG")
        .to_rgba8()
}

/// Quantized NDVI-like ramp with a limited palette
fn ramp_pixels(width: usize, height: usize, steps: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let step = (x * steps / width.max(1)) as u8;
            pixels.extend_from_slice(&[255 - step * 10, 100 + step * 5, (y % 2) as u8 * 40, 255]);
        }
    }
    pixels
}

// ============================================================================
// Basic PNG creation tests
// ============================================================================

#[test]
fn test_indexed_png_round_trips_pixels() {
    let pixels = [
        255, 0, 0, 255, // red
        0, 255, 0, 255, // green
        0, 255, 0, 255, // green
        255, 0, 0, 255, // red
    ];

    let png = create_png_auto(&pixels, 2, 2).unwrap();
    assert_eq!(&png[0..8], &PNG_SIGNATURE);
    // Color type 3 in IHDR
    assert_eq!(png[25], 3);
    assert_eq!(decode(&png).into_raw(), pixels.to_vec());
}

#[test]
fn test_rgba_png_round_trips_pixels() {
    let pixels = [
        255, 0, 0, 255, // red
        0, 255, 0, 255, // green
        0, 0, 255, 255, // blue
        255, 255, 0, 255, // yellow
    ];

    let png = create_png(&pixels, 2, 2).unwrap();
    assert_eq!(png[25], 6);
    assert_eq!(decode(&png).into_raw(), pixels.to_vec());
}

#[test]
fn test_transparency_survives_indexed_encoding() {
    let pixels = [
        255, 0, 0, 255, // opaque
        0, 0, 0, 0, // transparent
        0, 255, 0, 128, // semi-transparent
        0, 0, 255, 255, // opaque
    ];

    let png = create_png_auto(&pixels, 2, 2).unwrap();
    let decoded = decode(&png);
    assert_eq!(decoded.get_pixel(1, 0)[3], 0);
    assert_eq!(decoded.get_pixel(0, 1)[3], 128);
}

// ============================================================================
// Format selection tests
// ============================================================================

#[test]
fn test_many_colors_fall_back_to_rgba() {
    let pixels: Vec<u8> = (0..300u32)
        .flat_map(|i| [(i % 256) as u8, (i / 256) as u8 * 100, 7, 255])
        .collect();

    let png = create_png_auto(&pixels, 300, 1).unwrap();
    assert_eq!(png[25], 6);
    assert_eq!(decode(&png).into_raw(), pixels);
}

#[test]
fn test_indexed_smaller_than_rgba_for_limited_palette() {
    let pixels = ramp_pixels(64, 64, 16);

    let indexed = create_png_auto(&pixels, 64, 64).unwrap();
    let rgba = create_png(&pixels, 64, 64).unwrap();

    assert!(
        indexed.len() < rgba.len(),
        "Indexed PNG ({} bytes) should be smaller than RGBA ({} bytes)",
        indexed.len(),
        rgba.len()
    );
}

// ============================================================================
// Large image tests (parallel palette extraction)
// ============================================================================

#[test]
fn test_frame_sized_image_parallel_extraction() {
    // 300x300 is above the parallel threshold
    let pixels = ramp_pixels(300, 300, 20);

    let png = create_png_auto(&pixels, 300, 300).unwrap();
    let decoded = decode(&png);
    assert_eq!(decoded.dimensions(), (300, 300));
    assert_eq!(decoded.into_raw(), pixels);
}
