//! Geometric distortions: elastic warp and pixelation.

use corrupt_core::{Result, Severity};
use image::RgbImage;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::filters::{from_planes, gaussian_filter, sample_bilinear, to_planes, Border, Plane};
use super::resample::resize_box;
use crate::rng::RandomState;

/// (displacement scale, displacement smoothness, affine jitter), in units of 244 px
const ELASTIC: [(f32, f32, f32); 5] = [
    (2.0, 0.7, 0.1),
    (2.0, 0.08, 0.2),
    (0.05, 0.01, 0.02),
    (0.07, 0.01, 0.02),
    (0.12, 0.01, 0.02),
];
const ELASTIC_UNIT: f32 = 244.0;

const PIXELATE_SCALE: [f32; 5] = [0.6, 0.5, 0.4, 0.3, 0.25];

/// 2x3 affine matrix `[[a, b, c], [d, e, f]]` mapping `(x, y)` to `(ax + by + c, dx + ey + f)`
type Affine = [[f64; 3]; 2];

/// Affine transform taking the three `src` points onto `dst`, if `src` is not degenerate
fn affine_from_points(src: [[f64; 2]; 3], dst: [[f64; 2]; 3]) -> Option<Affine> {
    let det3 = |m: [[f64; 3]; 3]| {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };
    let basis = [
        [src[0][0], src[0][1], 1.0],
        [src[1][0], src[1][1], 1.0],
        [src[2][0], src[2][1], 1.0],
    ];
    let det = det3(basis);
    if det.abs() < 1e-9 {
        return None;
    }

    let mut affine = [[0.0; 3]; 2];
    for (row, coeffs) in affine.iter_mut().enumerate() {
        for (col, coeff) in coeffs.iter_mut().enumerate() {
            let mut m = basis;
            for i in 0..3 {
                m[i][col] = dst[i][row];
            }
            *coeff = det3(m) / det;
        }
    }
    Some(affine)
}

fn invert_affine(m: Affine) -> Option<Affine> {
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    if det.abs() < 1e-12 {
        return None;
    }
    let (a, b, d, e) = (m[1][1] / det, -m[0][1] / det, -m[1][0] / det, m[0][0] / det);
    let (c, f) = (-(a * m[0][2] + b * m[1][2]), -(d * m[0][2] + e * m[1][2]));
    Some([[a, b, c], [d, e, f]])
}

/// Random affine jitter of a centered triangle, bilinear with reflect-101 borders
fn random_affine(planes: [Plane; 3], jitter: f64, rng: &mut ChaCha8Rng) -> [Plane; 3] {
    let (width, height) = (planes[0].width, planes[0].height);
    let center = [(height / 2) as f64, (width / 2) as f64];
    let square = (width.min(height) / 3) as f64;
    let src = [
        [center[0] + square, center[1] + square],
        [center[0] + square, center[1] - square],
        [center[0] - square, center[1] - square],
    ];
    let mut dst = src;
    for point in dst.iter_mut() {
        for v in point.iter_mut() {
            *v += rng.gen_range(-jitter..jitter);
        }
    }

    let inverse = match affine_from_points(src, dst).and_then(invert_affine) {
        Some(inverse) => inverse,
        None => return planes,
    };

    planes.map(|plane| {
        Plane::from_fn(width, height, |x, y| {
            let (x, y) = (x as f64, y as f64);
            let sx = inverse[0][0] * x + inverse[0][1] * y + inverse[0][2];
            let sy = inverse[1][0] * x + inverse[1][1] * y + inverse[1][2];
            sample_bilinear(&plane, sx as f32, sy as f32, Border::Reflect101)
        })
    })
}

/// Smoothed uniform noise field scaled by `alpha`
fn displacement_field(
    width: usize,
    height: usize,
    sigma: f32,
    alpha: f32,
    rng: &mut ChaCha8Rng,
) -> Plane {
    let noise = Plane::from_fn(width, height, |_, _| rng.gen_range(-1.0f32..1.0));
    let mut field = gaussian_filter(&noise, sigma, 3.0, Border::Reflect);
    field.data.iter_mut().for_each(|v| *v *= alpha);
    field
}

/// Affine jitter followed by a smooth random displacement field
pub fn elastic(image: &RgbImage, severity: Severity, rng: &mut RandomState) -> Result<RgbImage> {
    let (alpha, sigma, jitter) = ELASTIC[severity.index()];
    let (alpha, sigma, jitter) = (alpha * ELASTIC_UNIT, sigma * ELASTIC_UNIT, jitter * ELASTIC_UNIT);
    let (width, height) = (image.width() as usize, image.height() as usize);
    let rng = rng.general();

    let warped = random_affine(to_planes(image), jitter as f64, rng);
    let dx = displacement_field(width, height, sigma, alpha, rng);
    let dy = displacement_field(width, height, sigma, alpha, rng);

    let out = warped.map(|plane| {
        Plane::from_fn(width, height, |x, y| {
            let sx = x as f32 + dx.get(x, y);
            let sy = y as f32 + dy.get(x, y);
            sample_bilinear(&plane, sx, sy, Border::Reflect)
        })
    });
    Ok(from_planes(&out))
}

/// Box-filter downsample then upsample back to the original size
pub fn pixelate(image: &RgbImage, severity: Severity, _rng: &mut RandomState) -> Result<RgbImage> {
    let scale = PIXELATE_SCALE[severity.index()];
    let (width, height) = image.dimensions();
    let small = resize_box(
        image,
        (width as f32 * scale) as u32,
        (height as f32 * scale) as u32,
    );
    Ok(resize_box(&small, width, height))
}
