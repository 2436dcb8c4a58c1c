//! Single-channel filtering primitives shared by the corruptions.
//!
//! Images are split into `f32` planes in [0, 1], filtered plane by plane and
//! merged back. Border handling follows the conventions of the filters the
//! corruption definitions were written against.

use image::{Rgb, RgbImage};

/// A single-channel `f32` image, row-major
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Plane {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl Plane {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.width + x] = value;
    }

    /// Reads with out-of-range coordinates mapped through `border`
    #[inline]
    pub fn get_border(&self, x: isize, y: isize, border: Border) -> f32 {
        self.get(
            border.index(x, self.width),
            border.index(y, self.height),
        )
    }

    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }
}

/// How coordinates outside the image are mapped back inside
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Border {
    /// `aaa|abcd|ddd`
    Nearest,
    /// `cba|abcd|dcb`, half-sample symmetric
    Reflect,
    /// `dcb|abcd|cba`, whole-sample symmetric
    Reflect101,
}

impl Border {
    pub fn index(self, i: isize, len: usize) -> usize {
        let n = len as isize;
        if n <= 1 {
            return 0;
        }
        let mapped = match self {
            Border::Nearest => i.clamp(0, n - 1),
            Border::Reflect => {
                let period = 2 * n;
                let m = i.rem_euclid(period);
                if m >= n {
                    period - 1 - m
                } else {
                    m
                }
            }
            Border::Reflect101 => {
                let period = 2 * n - 2;
                let m = i.rem_euclid(period);
                if m >= n {
                    period - m
                } else {
                    m
                }
            }
        };
        mapped as usize
    }
}

/// Converts 8-bit pixels to [0, 1] planes, one per channel
pub(crate) fn to_planes(image: &RgbImage) -> [Plane; 3] {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let mut planes = [
        Plane::new(width, height),
        Plane::new(width, height),
        Plane::new(width, height),
    ];
    for (i, pixel) in image.pixels().enumerate() {
        for c in 0..3 {
            planes[c].data[i] = pixel[c] as f32 / 255.0;
        }
    }
    planes
}

/// Clips planes to [0, 1] and rounds back to 8-bit pixels
pub(crate) fn from_planes(planes: &[Plane; 3]) -> RgbImage {
    let (width, height) = (planes[0].width as u32, planes[0].height as u32);
    let mut image = RgbImage::new(width, height);
    for (i, pixel) in image.pixels_mut().enumerate() {
        *pixel = Rgb([
            to_u8(planes[0].data[i]),
            to_u8(planes[1].data[i]),
            to_u8(planes[2].data[i]),
        ]);
    }
    image
}

/// Clip to [0, 1], scale to [0, 255], round half to even
#[inline]
pub(crate) fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round_ties_even() as u8
}

/// Normalized 1-D gaussian with `radius = int(truncate * sigma + 0.5)`
pub(crate) fn gaussian_kernel(sigma: f32, truncate: f32) -> Vec<f32> {
    let radius = (truncate * sigma + 0.5) as isize;
    gaussian_weights(radius, sigma)
}

/// Normalized 1-D gaussian of fixed odd size
pub(crate) fn gaussian_kernel_sized(size: usize, sigma: f32) -> Vec<f32> {
    gaussian_weights((size / 2) as isize, sigma)
}

fn gaussian_weights(radius: isize, sigma: f32) -> Vec<f32> {
    let sigma = sigma as f64;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x * x) as f64 / (sigma * sigma)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / total) as f32).collect()
}

/// Correlates rows then columns with a symmetric 1-D kernel
pub(crate) fn convolve_separable(plane: &Plane, kernel: &[f32], border: Border) -> Plane {
    let radius = (kernel.len() / 2) as isize;
    let (width, height) = (plane.width, plane.height);

    let mut rows = Plane::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0f32;
            for (k, w) in kernel.iter().enumerate() {
                let sx = x as isize + k as isize - radius;
                acc += w * plane.get_border(sx, y as isize, border);
            }
            rows.set(x, y, acc);
        }
    }

    let mut out = Plane::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0f32;
            for (k, w) in kernel.iter().enumerate() {
                let sy = y as isize + k as isize - radius;
                acc += w * rows.get_border(x as isize, sy, border);
            }
            out.set(x, y, acc);
        }
    }
    out
}

pub(crate) fn gaussian_filter(plane: &Plane, sigma: f32, truncate: f32, border: Border) -> Plane {
    convolve_separable(plane, &gaussian_kernel(sigma, truncate), border)
}

/// Gaussian filter applied to each channel independently
pub(crate) fn gaussian_filter_rgb(planes: &[Plane; 3], sigma: f32, border: Border) -> [Plane; 3] {
    [
        gaussian_filter(&planes[0], sigma, 4.0, border),
        gaussian_filter(&planes[1], sigma, 4.0, border),
        gaussian_filter(&planes[2], sigma, 4.0, border),
    ]
}

/// 2-D correlation with the kernel anchored at its center
pub(crate) fn filter2d(plane: &Plane, kernel: &Plane, border: Border) -> Plane {
    let (kx0, ky0) = ((kernel.width / 2) as isize, (kernel.height / 2) as isize);
    Plane::from_fn(plane.width, plane.height, |x, y| {
        let mut acc = 0.0f32;
        for ky in 0..kernel.height {
            let sy = y as isize + ky as isize - ky0;
            for kx in 0..kernel.width {
                let w = kernel.get(kx, ky);
                if w == 0.0 {
                    continue;
                }
                let sx = x as isize + kx as isize - kx0;
                acc += w * plane.get_border(sx, sy, border);
            }
        }
        acc
    })
}

/// Bilinear sample at fractional `(x, y)`
pub(crate) fn sample_bilinear(plane: &Plane, x: f32, y: f32, border: Border) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as isize, y0 as isize);

    let p00 = plane.get_border(x0, y0, border);
    let p10 = plane.get_border(x0 + 1, y0, border);
    let p01 = plane.get_border(x0, y0 + 1, border);
    let p11 = plane.get_border(x0 + 1, y0 + 1, border);

    p00 * (1.0 - fx) * (1.0 - fy) + p10 * fx * (1.0 - fy) + p01 * (1.0 - fx) * fy + p11 * fx * fy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_border_modes() {
        // len 5: indices 0..=4
        assert_eq!(Border::Nearest.index(-3, 5), 0);
        assert_eq!(Border::Nearest.index(7, 5), 4);

        assert_eq!(Border::Reflect.index(-1, 5), 0);
        assert_eq!(Border::Reflect.index(-2, 5), 1);
        assert_eq!(Border::Reflect.index(5, 5), 4);
        assert_eq!(Border::Reflect.index(6, 5), 3);

        assert_eq!(Border::Reflect101.index(-1, 5), 1);
        assert_eq!(Border::Reflect101.index(-2, 5), 2);
        assert_eq!(Border::Reflect101.index(5, 5), 3);

        // far outside still lands inside
        for i in -40..40 {
            assert!(Border::Reflect.index(i, 5) < 5);
            assert!(Border::Reflect101.index(i, 5) < 5);
        }
    }

    #[test]
    fn test_gaussian_kernel_normalized() {
        let k = gaussian_kernel(1.5, 4.0);
        assert_eq!(k.len(), 2 * 6 + 1);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(k[6] > k[5] && (k[5] - k[7]).abs() < 1e-7);
    }

    #[test]
    fn test_gaussian_filter_preserves_constant() {
        let plane = Plane::from_fn(9, 7, |_, _| 0.25);
        for border in [Border::Nearest, Border::Reflect, Border::Reflect101] {
            let out = gaussian_filter(&plane, 2.0, 4.0, border);
            assert!(out.data.iter().all(|v| (v - 0.25).abs() < 1e-5));
        }
    }

    #[test]
    fn test_filter2d_identity() {
        let plane = Plane::from_fn(6, 6, |x, y| (x * 6 + y) as f32 / 36.0);
        let mut kernel = Plane::new(3, 3);
        kernel.set(1, 1, 1.0);
        assert_eq!(filter2d(&plane, &kernel, Border::Reflect101), plane);
    }

    #[test]
    fn test_sample_bilinear_midpoint() {
        let plane = Plane::from_fn(2, 2, |x, _| x as f32);
        assert!((sample_bilinear(&plane, 0.5, 0.5, Border::Nearest) - 0.5).abs() < 1e-6);
        assert_eq!(sample_bilinear(&plane, 1.0, 0.0, Border::Nearest), 1.0);
    }

    #[test]
    fn test_plane_round_trip() {
        let image = RgbImage::from_fn(4, 3, |x, y| Rgb([x as u8 * 60, y as u8 * 80, 7]));
        assert_eq!(from_planes(&to_planes(&image)), image);
    }

    #[test]
    fn test_to_u8_clips_and_rounds() {
        assert_eq!(to_u8(-0.2), 0);
        assert_eq!(to_u8(1.7), 255);
        assert_eq!(to_u8(128.0 / 255.0), 128);
    }
}
