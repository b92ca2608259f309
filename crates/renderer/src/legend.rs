//! Vertical color-bar legend with numeric tick labels.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::rect::Rect;
use once_cell::sync::Lazy;
use rusttype::{point, Font, Scale};
use tracing::warn;

use crate::colormap::{rdylgn, ValueScale};

/// Embedded font data - DejaVu Sans Mono
const FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

static FONT: Lazy<Option<Font<'static>>> = Lazy::new(|| {
    let font = Font::try_from_bytes(FONT_DATA);
    if font.is_none() {
        warn!("Failed to load legend font; labels will be skipped");
    }
    font
});

/// Gap between the map and the color bar
const GAP: u32 = 6;
const BAR_WIDTH: u32 = 12;
const TICK_LEN: u32 = 4;
const LABEL_PAD: u32 = 2;
const MARGIN: u32 = 4;
const FONT_SIZE: f32 = 11.0;
/// Labels never get less room than this one
const NARROWEST_LABEL: &str = "-0.00";

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([40, 40, 40, 255]);

fn font_scale() -> Scale {
    Scale::uniform(FONT_SIZE)
}

/// Rendered width of `text` in pixels, 0 when the font is unavailable.
pub fn text_width(text: &str) -> u32 {
    let Some(font) = FONT.as_ref() else { return 0 };
    font.layout(text, font_scale(), point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
        .ceil() as u32
}

fn text_height() -> u32 {
    FONT.as_ref()
        .map(|font| {
            let v = font.v_metrics(font_scale());
            (v.ascent - v.descent).ceil() as u32
        })
        .unwrap_or(0)
}

fn tick_values(scale: ValueScale) -> [(f32, f32); 3] {
    [(1.0, scale.max), (0.5, scale.mid()), (0.0, scale.min)]
}

/// Width in pixels of the legend panel for `scale`, wide enough for its
/// widest tick label.
pub fn legend_width(scale: ValueScale) -> u32 {
    let label = tick_values(scale)
        .iter()
        .map(|&(_, v)| text_width(&format_tick(v)))
        .chain(std::iter::once(text_width(NARROWEST_LABEL)))
        .max()
        .unwrap_or(0);
    GAP + BAR_WIDTH + TICK_LEN + LABEL_PAD + label + MARGIN
}

/// Tick label text: two decimals, no negative zero.
pub fn format_tick(value: f32) -> String {
    let text = format!("{:.2}", value);
    if text == "-0.00" {
        "0.00".to_string()
    } else {
        text
    }
}

/// Paint the legend panel into `img`, starting at column `x0`.
///
/// The bar runs from `scale.max` at the top to `scale.min` at the bottom,
/// with ticks at min, mid and max.
pub fn draw_legend(img: &mut RgbaImage, x0: u32, scale: ValueScale) {
    let height = img.height();
    if height == 0 || x0 >= img.width() {
        return;
    }
    draw_filled_rect_mut(
        img,
        Rect::at(x0 as i32, 0).of_size(img.width() - x0, height),
        BACKGROUND,
    );

    let top = MARGIN.min(height - 1);
    let bottom = height.saturating_sub(MARGIN + 1).max(top);
    let bar_x = x0 + GAP;
    let span = (bottom - top).max(1) as f32;
    for y in top..=bottom {
        let t = 1.0 - (y - top) as f32 / span;
        let c = rdylgn(t).to_array();
        for x in bar_x..(bar_x + BAR_WIDTH).min(img.width()) {
            img.put_pixel(x, y, Rgba(c));
        }
    }
    if bottom > top {
        draw_hollow_rect_mut(
            img,
            Rect::at(bar_x as i32, top as i32).of_size(BAR_WIDTH, bottom - top + 1),
            INK,
        );
    }

    let tick_x = (bar_x + BAR_WIDTH) as f32;
    let label_x = (bar_x + BAR_WIDTH + TICK_LEN + LABEL_PAD) as i32;
    let text_h = text_height() as i32;
    for (t, value) in tick_values(scale) {
        let y = top as f32 + (1.0 - t) * span;
        draw_line_segment_mut(img, (tick_x, y), (tick_x + TICK_LEN as f32, y), INK);
        if let Some(font) = FONT.as_ref() {
            let label_y = (y as i32 - text_h / 2).clamp(0, (height as i32 - text_h).max(0));
            draw_text_mut(img, INK, label_x, label_y, font_scale(), font, &format_tick(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(0.5), "0.50");
        assert_eq!(format_tick(-0.251), "-0.25");
        assert_eq!(format_tick(-0.0001), "0.00");
    }

    #[test]
    fn test_font_loads() {
        assert!(FONT.is_some());
        assert!(text_width("0.50") > 0);
        assert!(text_height() > 0);
    }

    #[test]
    fn test_width_grows_with_label_length() {
        let narrow = legend_width(ValueScale::FALLBACK);
        assert_eq!(narrow, legend_width(ValueScale::new(0.1, 0.4)));
        assert!(legend_width(ValueScale::new(-10.0, 12.0)) > narrow);
        assert!(text_width("-10.00") > text_width("-1.00"));
    }

    #[test]
    fn test_wide_labels_fit_inside_panel() {
        let scale = ValueScale::new(-10.0, 12.0);
        let width = legend_width(scale);
        let mut img = RgbaImage::new(width, 80);
        draw_legend(&mut img, 0, scale);

        let label_x = GAP + BAR_WIDTH + TICK_LEN + LABEL_PAD;
        let inked = |x: u32| (0..img.height()).any(|y| img.get_pixel(x, y)[0] < 200);
        assert!((label_x..width).any(inked), "labels should leave ink");
        for x in width - MARGIN..width {
            assert!(!inked(x), "column {x} inside the right margin has ink");
        }
    }

    #[test]
    fn test_legend_bar_runs_green_to_red() {
        let scale = ValueScale::new(-0.2, 0.8);
        let width = legend_width(scale);
        let mut img = RgbaImage::new(width, 100);
        draw_legend(&mut img, 0, scale);
        let x = GAP + BAR_WIDTH / 2;
        let top = img.get_pixel(x, MARGIN + 2);
        let bottom = img.get_pixel(x, 100 - MARGIN - 3);
        assert!(top[1] > top[0], "top of bar should be green");
        assert!(bottom[0] > bottom[1], "bottom of bar should be red");
        // Panel background is opaque
        assert_eq!(img.get_pixel(width - 1, 50)[3], 255);
    }
}
