//! Resampling primitives: box-filter resize and center-cropped zoom.

use image::{Rgb, RgbImage};

use super::filters::{sample_bilinear, Border, Plane};

/// Per-output-pixel source window and weights for a box filter
struct Coefficients {
    start: usize,
    weights: Vec<f64>,
}

fn box_filter(x: f64) -> f64 {
    if x > -0.5 && x <= 0.5 {
        1.0
    } else {
        0.0
    }
}

fn box_coefficients(in_size: usize, out_size: usize) -> Vec<Coefficients> {
    let scale = in_size as f64 / out_size as f64;
    let filter_scale = scale.max(1.0);
    let support = 0.5 * filter_scale;
    let ss = 1.0 / filter_scale;

    (0..out_size)
        .map(|xx| {
            let center = (xx as f64 + 0.5) * scale;
            let xmin = ((center - support + 0.5) as isize).max(0) as usize;
            let xmax = ((center + support + 0.5) as isize).min(in_size as isize) as usize;
            let mut weights: Vec<f64> = (xmin..xmax)
                .map(|x| box_filter((x as f64 - center + 0.5) * ss))
                .collect();
            let total: f64 = weights.iter().sum();
            if total != 0.0 {
                weights.iter_mut().for_each(|w| *w /= total);
            }
            Coefficients {
                start: xmin,
                weights,
            }
        })
        .collect()
}

#[inline]
fn round_u8(value: f64) -> u8 {
    (value + 0.5).floor().clamp(0.0, 255.0) as u8
}

/// Box-filter resize, horizontal pass then vertical, rounding between passes
pub(crate) fn resize_box(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let width = width.max(1);
    let height = height.max(1);

    let horizontal = box_coefficients(image.width() as usize, width as usize);
    let mut rows = RgbImage::new(width, image.height());
    for y in 0..image.height() {
        for (x, coeffs) in horizontal.iter().enumerate() {
            let mut acc = [0.0f64; 3];
            for (k, w) in coeffs.weights.iter().enumerate() {
                let p = image.get_pixel((coeffs.start + k) as u32, y);
                for c in 0..3 {
                    acc[c] += w * p[c] as f64;
                }
            }
            rows.put_pixel(x as u32, y, Rgb(acc.map(round_u8)));
        }
    }

    let vertical = box_coefficients(image.height() as usize, height as usize);
    let mut out = RgbImage::new(width, height);
    for (y, coeffs) in vertical.iter().enumerate() {
        for x in 0..width {
            let mut acc = [0.0f64; 3];
            for (k, w) in coeffs.weights.iter().enumerate() {
                let p = rows.get_pixel(x, (coeffs.start + k) as u32);
                for c in 0..3 {
                    acc[c] += w * p[c] as f64;
                }
            }
            out.put_pixel(x, y as u32, Rgb(acc.map(round_u8)));
        }
    }
    out
}

/// Zooms into the center of `plane` by `zoom` (>= 1), keeping its size.
///
/// The central `ceil(n / zoom)` window is stretched with linear
/// interpolation to `round(window * zoom)` samples and trimmed back to `n`.
pub(crate) fn clipped_zoom(plane: &Plane, zoom: f64) -> Plane {
    let axis = |n: usize| {
        let window = ((n as f64 / zoom).ceil() as usize).clamp(1, n);
        let offset = (n - window) / 2;
        let zoomed = ((window as f64 * zoom).round_ties_even() as usize).max(n);
        let trim = (zoomed - n) / 2;
        let step = if zoomed > 1 {
            (window - 1) as f64 / (zoomed - 1) as f64
        } else {
            0.0
        };
        (offset, trim, step)
    };

    let (top, trim_top, step_y) = axis(plane.height);
    let (left, trim_left, step_x) = axis(plane.width);

    Plane::from_fn(plane.width, plane.height, |x, y| {
        let sy = top as f64 + (y + trim_top) as f64 * step_y;
        let sx = left as f64 + (x + trim_left) as f64 * step_x;
        sample_bilinear(plane, sx as f32, sy as f32, Border::Nearest)
    })
}
