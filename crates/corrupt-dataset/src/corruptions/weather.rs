//! Atmospheric veiling: fog over a plasma fractal.

use corrupt_core::{Result, Severity};
use image::RgbImage;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::filters::{from_planes, to_planes};
use crate::rng::RandomState;

/// (fog strength, wibble decay)
const FOG: [(f64, f64); 5] = [(1.5, 2.0), (2.0, 2.0), (2.5, 1.7), (2.5, 1.5), (3.0, 1.4)];

/// Square height map in [0, 1] generated by the diamond-square algorithm.
///
/// `map_size` must be a power of two. Random offsets are drawn row-major,
/// one per filled cell, in the order squares, row-edge diamonds, column-edge diamonds.
pub(crate) fn plasma_fractal(map_size: usize, wibble_decay: f64, rng: &mut ChaCha8Rng) -> Vec<f64> {
    debug_assert!(map_size.is_power_of_two());
    let n = map_size;
    let mut map = vec![0.0f64; n * n];
    let mut step = n;
    let mut wibble = 100.0f64;

    let wibbled_mean = |sum: f64, wibble: f64, rng: &mut ChaCha8Rng| {
        sum / 4.0 + wibble * rng.gen_range(-wibble..wibble)
    };

    while step >= 2 {
        let half = step / 2;
        let cells = n / step;

        // squares: centre of each cell from its four corners
        let corner = |map: &[f64], i: usize, j: usize| map[(i % cells) * step * n + (j % cells) * step];
        let mut squares = vec![0.0f64; cells * cells];
        for i in 0..cells {
            for j in 0..cells {
                squares[i * cells + j] = corner(&map, i, j)
                    + corner(&map, i + 1, j)
                    + corner(&map, i, j + 1)
                    + corner(&map, i + 1, j + 1);
            }
        }
        for i in 0..cells {
            for j in 0..cells {
                let value = wibbled_mean(squares[i * cells + j], wibble, rng);
                map[(half + i * step) * n + half + j * step] = value;
            }
        }

        // diamonds: edge midpoints from the two adjacent corners and centres
        let centre = |map: &[f64], i: usize, j: usize| {
            map[(half + (i % cells) * step) * n + half + (j % cells) * step]
        };
        let up = |i: usize| (i + cells - 1) % cells;

        let mut row_edges = vec![0.0f64; cells * cells];
        let mut col_edges = vec![0.0f64; cells * cells];
        for i in 0..cells {
            for j in 0..cells {
                row_edges[i * cells + j] = centre(&map, i, j)
                    + centre(&map, up(i), j)
                    + corner(&map, i, j)
                    + corner(&map, i, j + 1);
                col_edges[i * cells + j] = centre(&map, i, j)
                    + centre(&map, i, up(j))
                    + corner(&map, i, j)
                    + corner(&map, i + 1, j);
            }
        }
        for i in 0..cells {
            for j in 0..cells {
                let value = wibbled_mean(row_edges[i * cells + j], wibble, rng);
                map[(i * step) * n + half + j * step] = value;
            }
        }
        for i in 0..cells {
            for j in 0..cells {
                let value = wibbled_mean(col_edges[i * cells + j], wibble, rng);
                map[(half + i * step) * n + j * step] = value;
            }
        }

        step /= 2;
        wibble /= wibble_decay;
    }

    let min = map.iter().copied().fold(f64::INFINITY, f64::min);
    map.iter_mut().for_each(|v| *v -= min);
    let max = map.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 {
        map.iter_mut().for_each(|v| *v /= max);
    }
    map
}

/// Adds a fractal haze and compresses the dynamic range
pub fn fog(image: &RgbImage, severity: Severity, rng: &mut RandomState) -> Result<RgbImage> {
    let (strength, wibble_decay) = FOG[severity.index()];
    let (width, height) = (image.width() as usize, image.height() as usize);

    let max_val = image.iter().copied().max().unwrap_or(0) as f64 / 255.0;
    let map_size = width.max(height).max(3).next_power_of_two();
    let haze = plasma_fractal(map_size, wibble_decay, rng.general());

    let mut planes = to_planes(image);
    for plane in planes.iter_mut() {
        for y in 0..height {
            for x in 0..width {
                let value = plane.get(x, y) as f64 + strength * haze[y * map_size + x];
                plane.set(x, y, (value * max_val / (max_val + strength)) as f32);
            }
        }
    }
    Ok(from_planes(&planes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corruptions::test_support::{mse, test_image};
    use rand::SeedableRng;

    #[test]
    fn test_plasma_fractal_normalized() {
        let mut rng = ChaCha8Rng::seed_from_u64(135);
        let map = plasma_fractal(32, 2.0, &mut rng);
        assert_eq!(map.len(), 32 * 32);
        let min = map.iter().copied().fold(f64::INFINITY, f64::min);
        let max = map.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(min, 0.0);
        assert!((max - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_plasma_fractal_deterministic() {
        let a = plasma_fractal(16, 1.5, &mut ChaCha8Rng::seed_from_u64(1));
        let b = plasma_fractal(16, 1.5, &mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_fog_non_square_image() {
        let image = test_image(40, 24);
        let out = fog(&image, Severity::new(3).unwrap(), &mut RandomState::seed_from_u64(2)).unwrap();
        assert_eq!(out.dimensions(), (40, 24));
        assert_ne!(out, image);
    }

    #[test]
    fn test_fog_stronger_at_top_severity() {
        let image = test_image(32, 32);
        let light = fog(&image, Severity::new(1).unwrap(), &mut RandomState::seed_from_u64(6)).unwrap();
        let heavy = fog(&image, Severity::new(5).unwrap(), &mut RandomState::seed_from_u64(6)).unwrap();
        assert!(mse(&image, &heavy) > mse(&image, &light));
    }
}
