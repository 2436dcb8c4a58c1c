//! Global photometric shifts: brightness and contrast.

use corrupt_core::{Result, Severity};
use image::{Rgb, RgbImage};

use super::filters::to_u8;
use crate::rng::RandomState;

const BRIGHTNESS_SHIFT: [f64; 5] = [0.1, 0.2, 0.3, 0.4, 0.5];
const CONTRAST_SCALE: [f64; 5] = [0.4, 0.3, 0.2, 0.1, 0.05];

/// RGB in [0, 1] to (hue, saturation, value), hue in [0, 1)
pub(crate) fn rgb_to_hsv([r, g, b]: [f64; 3]) -> [f64; 3] {
    let v = r.max(g).max(b);
    let delta = v - r.min(g).min(b);
    if delta == 0.0 {
        return [0.0, 0.0, v];
    }
    let s = delta / v;
    // blue wins ties, then green
    let h = if b == v {
        4.0 + (r - g) / delta
    } else if g == v {
        2.0 + (b - r) / delta
    } else {
        (g - b) / delta
    };
    [(h / 6.0).rem_euclid(1.0), s, v]
}

pub(crate) fn hsv_to_rgb([h, s, v]: [f64; 3]) -> [f64; 3] {
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    match (sector as i64).rem_euclid(6) {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

/// Raises the HSV value channel
pub fn brightness(image: &RgbImage, severity: Severity, _rng: &mut RandomState) -> Result<RgbImage> {
    let shift = BRIGHTNESS_SHIFT[severity.index()];
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let rgb = pixel.0.map(|v| v as f64 / 255.0);
        let [h, s, v] = rgb_to_hsv(rgb);
        let shifted = hsv_to_rgb([h, s, (v + shift).clamp(0.0, 1.0)]);
        *pixel = Rgb(shifted.map(|v| to_u8(v as f32)));
    }
    Ok(out)
}

/// Pulls every channel towards its mean
pub fn contrast(image: &RgbImage, severity: Severity, _rng: &mut RandomState) -> Result<RgbImage> {
    let scale = CONTRAST_SCALE[severity.index()];
    let count = (image.width() as f64 * image.height() as f64).max(1.0);

    let mut means = [0.0f64; 3];
    for pixel in image.pixels() {
        for c in 0..3 {
            means[c] += pixel[c] as f64 / 255.0;
        }
    }
    means.iter_mut().for_each(|m| *m /= count);

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for c in 0..3 {
            let x = pixel[c] as f64 / 255.0;
            pixel[c] = to_u8(((x - means[c]) * scale + means[c]) as f32);
        }
    }
    Ok(out)
}
