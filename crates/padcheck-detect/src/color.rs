//! RGB to HSV conversion.

use padcheck_core::RgbaImageView;

/// One HSV sample: hue in degrees `[0, 360)`, saturation and value in percent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Hsv {
    pub const fn new(h: f32, s: f32, v: f32) -> Self {
        Self { h, s, v }
    }
}

/// Per-pixel HSV buffer, row-major.
#[derive(Clone, Debug)]
pub struct HsvImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<Hsv>,
}

impl HsvImage {
    /// Uniform buffer, mostly useful to build synthetic inputs.
    pub fn filled(width: usize, height: usize, hsv: Hsv) -> Self {
        Self {
            width,
            height,
            data: vec![hsv; width * height],
        }
    }
}

/// Each component comes from one division of exact integer terms, so a value
/// that is exactly on a range bound (hue 200, say) stays on it.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let v = (max * 100) as f32 / 255.0;

    if delta == 0 {
        return Hsv::new(0.0, 0.0, v);
    }

    // Hue in degrees times delta.
    let mut numerator = if max == r {
        60 * (g - b)
    } else if max == g {
        60 * (b - r) + 120 * delta
    } else {
        60 * (r - g) + 240 * delta
    };
    if numerator < 0 {
        numerator += 360 * delta;
    }
    let mut h = numerator as f32 / delta as f32;
    if h >= 360.0 {
        h -= 360.0;
    }

    Hsv::new(h, (delta * 100) as f32 / max as f32, v)
}

/// Convert a whole frame. The caller validates the buffer beforehand.
pub fn rgba_to_hsv(frame: &RgbaImageView<'_>) -> HsvImage {
    let data = frame
        .rgb_pixels()
        .map(|[r, g, b]| rgb_to_hsv(r, g, b))
        .collect();
    HsvImage {
        width: frame.width,
        height: frame.height,
        data,
    }
}
