//! Spatial blurs: defocus, frosted glass and zoom.

use corrupt_core::{Result, Severity};
use image::{Rgb, RgbImage};
use rand::Rng;

use super::filters::{
    convolve_separable, filter2d, from_planes, gaussian_filter_rgb, gaussian_kernel_sized,
    to_planes, Border, Plane,
};
use super::resample::clipped_zoom;
use crate::rng::RandomState;

/// (disk radius, anti-alias sigma)
const DEFOCUS: [(f32, f32); 5] = [(3.0, 0.1), (4.0, 0.5), (6.0, 0.5), (8.0, 0.5), (10.0, 0.5)];

/// (gaussian sigma, max pixel displacement, shuffle iterations)
const FROSTED_GLASS: [(f32, isize, usize); 5] =
    [(0.7, 1, 2), (0.9, 2, 1), (1.0, 2, 3), (1.1, 3, 2), (1.5, 4, 2)];

/// (zoom step, number of zoom factors starting at 1.0)
const ZOOM_STEPS: [(f64, usize); 5] = [(0.01, 11), (0.01, 16), (0.02, 11), (0.02, 13), (0.03, 11)];

/// Normalized disk kernel, lightly blurred to soften its aliased rim
pub(crate) fn disk(radius: f32, alias_blur: f32) -> Plane {
    let (extent, blur_size) = if radius <= 8.0 {
        (8isize, 3)
    } else {
        (radius as isize, 5)
    };
    let side = (2 * extent + 1) as usize;
    let mut kernel = Plane::from_fn(side, side, |x, y| {
        let dx = x as isize - extent;
        let dy = y as isize - extent;
        if ((dx * dx + dy * dy) as f32) <= radius * radius {
            1.0
        } else {
            0.0
        }
    });
    let total = kernel.sum();
    kernel.data.iter_mut().for_each(|v| *v /= total);

    convolve_separable(
        &kernel,
        &gaussian_kernel_sized(blur_size, alias_blur),
        Border::Reflect101,
    )
}

/// Out-of-focus blur with a disk kernel
pub fn defocus_blur(image: &RgbImage, severity: Severity, _rng: &mut RandomState) -> Result<RgbImage> {
    let (radius, alias_blur) = DEFOCUS[severity.index()];
    let kernel = disk(radius, alias_blur);
    let planes = to_planes(image);
    let blurred = [
        filter2d(&planes[0], &kernel, Border::Reflect101),
        filter2d(&planes[1], &kernel, Border::Reflect101),
        filter2d(&planes[2], &kernel, Border::Reflect101),
    ];
    Ok(from_planes(&blurred))
}

/// Gaussian blur, local pixel shuffling, gaussian blur again
pub fn frosted_glass_blur(
    image: &RgbImage,
    severity: Severity,
    rng: &mut RandomState,
) -> Result<RgbImage> {
    let (sigma, max_delta, iterations) = FROSTED_GLASS[severity.index()];

    let blurred = gaussian_filter_rgb(&to_planes(image), sigma, Border::Nearest);
    // truncating conversion back to 8 bits
    let mut shuffled = RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let (x, y) = (x as usize, y as usize);
        Rgb([
            (blurred[0].get(x, y) * 255.0) as u8,
            (blurred[1].get(x, y) * 255.0) as u8,
            (blurred[2].get(x, y) * 255.0) as u8,
        ])
    });

    let rng = rng.general();
    let (height, width) = (image.height() as isize, image.width() as isize);
    for _ in 0..iterations {
        for h in ((max_delta + 1)..=(height - max_delta)).rev() {
            for w in ((max_delta + 1)..=(width - max_delta)).rev() {
                let dx = rng.gen_range(-max_delta..max_delta);
                let dy = rng.gen_range(-max_delta..max_delta);
                let (x0, y0) = (w as u32, h as u32);
                let (x1, y1) = ((w + dx) as u32, (h + dy) as u32);
                let a = *shuffled.get_pixel(x0, y0);
                let b = *shuffled.get_pixel(x1, y1);
                shuffled.put_pixel(x0, y0, b);
                shuffled.put_pixel(x1, y1, a);
            }
        }
    }

    let reblurred = gaussian_filter_rgb(&to_planes(&shuffled), sigma, Border::Nearest);
    Ok(from_planes(&reblurred))
}

/// Average of the image and increasingly zoomed copies of its center
pub fn zoom_blur(image: &RgbImage, severity: Severity, _rng: &mut RandomState) -> Result<RgbImage> {
    let (step, count) = ZOOM_STEPS[severity.index()];
    let planes = to_planes(image);
    let mut accum = planes.clone();

    for i in 0..count {
        let zoom = 1.0 + i as f64 * step;
        for (acc, plane) in accum.iter_mut().zip(planes.iter()) {
            let zoomed = clipped_zoom(plane, zoom);
            acc.data
                .iter_mut()
                .zip(zoomed.data.iter())
                .for_each(|(a, z)| *a += z);
        }
    }

    let norm = (count + 1) as f32;
    for plane in accum.iter_mut() {
        plane.data.iter_mut().for_each(|v| *v /= norm);
    }
    Ok(from_planes(&accum))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corruptions::test_support::{mse, test_image};

    #[test]
    fn test_disk_kernel_shape() {
        let small = disk(3.0, 0.1);
        assert_eq!((small.width, small.height), (17, 17));
        assert!((small.sum() - 1.0).abs() < 1e-4);
        assert!(small.get(8, 8) > small.get(0, 0));

        let large = disk(10.0, 0.5);
        assert_eq!((large.width, large.height), (21, 21));
    }

    #[test]
    fn test_defocus_flat_image_unchanged() {
        let image = RgbImage::from_pixel(20, 20, Rgb([90, 120, 150]));
        let out = defocus_blur(&image, Severity::new(3).unwrap(), &mut RandomState::seed_from_u64(0)).unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn test_frosted_glass_deterministic() {
        let image = test_image(24, 24);
        let severity = Severity::new(2).unwrap();
        let a = frosted_glass_blur(&image, severity, &mut RandomState::seed_from_u64(8)).unwrap();
        let b = frosted_glass_blur(&image, severity, &mut RandomState::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, image);
    }

    #[test]
    fn test_frosted_glass_tiny_image() {
        // too small for any shuffle window
        let image = test_image(4, 4);
        let out = frosted_glass_blur(&image, Severity::new(5).unwrap(), &mut RandomState::seed_from_u64(1)).unwrap();
        assert_eq!(out.dimensions(), (4, 4));
    }

    #[test]
    fn test_frosted_glass_stronger_at_top_severity() {
        let image = test_image(96, 96);
        let light = frosted_glass_blur(&image, Severity::new(1).unwrap(), &mut RandomState::seed_from_u64(0)).unwrap();
        let heavy = frosted_glass_blur(&image, Severity::new(5).unwrap(), &mut RandomState::seed_from_u64(0)).unwrap();
        assert!(mse(&image, &heavy) > mse(&image, &light));
    }

    #[test]
    fn test_zoom_blur_grows_with_severity() {
        let image = test_image(48, 48);
        let errors: Vec<f64> = Severity::all()
            .map(|s| mse(&image, &zoom_blur(&image, s, &mut RandomState::seed_from_u64(0)).unwrap()))
            .collect();
        assert!(errors[0] > 0.0);
        assert!(errors.windows(2).all(|w| w[0] <= w[1]), "{errors:?}");
    }

    #[test]
    fn test_defocus_grows_with_severity() {
        let image = test_image(48, 48);
        let errors: Vec<f64> = Severity::all()
            .map(|s| mse(&image, &defocus_blur(&image, s, &mut RandomState::seed_from_u64(0)).unwrap()))
            .collect();
        assert!(errors.windows(2).all(|w| w[0] <= w[1]), "{errors:?}");
    }
}
