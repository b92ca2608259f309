//! Colors, the diverging red-yellow-green scale, and value scaling.

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Anchor colors of the RdYlGn scale, evenly spaced from 0 (red) to 1
/// (green) with pale yellow at the midpoint.
const RDYLGN: [Color; 11] = [
    Color::opaque(165, 0, 38),
    Color::opaque(215, 48, 39),
    Color::opaque(244, 109, 67),
    Color::opaque(253, 174, 97),
    Color::opaque(254, 224, 139),
    Color::opaque(255, 255, 191),
    Color::opaque(217, 239, 139),
    Color::opaque(166, 217, 106),
    Color::opaque(102, 189, 99),
    Color::opaque(26, 152, 80),
    Color::opaque(0, 104, 55),
];

/// Number of discrete colors the heatmap draws from.
pub const LUT_SIZE: usize = 256;

/// Linear color interpolation
fn interpolate_color(c1: Color, c2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Color::new(mix(c1.r, c2.r), mix(c1.g, c2.g), mix(c1.b, c2.b), mix(c1.a, c2.a))
}

/// RdYlGn color at normalized position `t` (clamped to [0, 1]).
pub fn rdylgn(t: f32) -> Color {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let pos = t * (RDYLGN.len() - 1) as f32;
    let i = (pos.floor() as usize).min(RDYLGN.len() - 2);
    interpolate_color(RDYLGN[i], RDYLGN[i + 1], pos - i as f32)
}

/// The RdYlGn scale quantized to [`LUT_SIZE`] entries.
pub fn rdylgn_lut() -> Vec<Color> {
    (0..LUT_SIZE)
        .map(|i| rdylgn(i as f32 / (LUT_SIZE - 1) as f32))
        .collect()
}

/// Linear mapping from data values onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueScale {
    pub min: f32,
    pub max: f32,
}

impl ValueScale {
    /// Range used when the data gives none.
    pub const FALLBACK: ValueScale = ValueScale { min: -1.0, max: 1.0 };

    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Scale spanning the finite values of `values`, or [`Self::FALLBACK`]
    /// when there are none or they are all equal.
    pub fn autoscale(values: &[f32]) -> Self {
        let (min, max) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if min.is_finite() && max > min {
            Self { min, max }
        } else {
            Self::FALLBACK
        }
    }

    pub fn mid(&self) -> f32 {
        (self.min + self.max) / 2.0
    }

    /// Position of `value` within the scale, clamped to [0, 1].
    pub fn normalize(&self, value: f32) -> f32 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}
