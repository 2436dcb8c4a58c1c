//! Pixel-level stochastic noise: gaussian, shot and impulse.

use corrupt_core::{Error, Result, Severity};
use image::RgbImage;
use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};

use super::filters::to_u8;
use crate::rng::RandomState;

const GAUSSIAN_SIGMA: [f64; 5] = [0.08, 0.12, 0.18, 0.26, 0.38];
const SHOT_PHOTONS: [f64; 5] = [60.0, 25.0, 12.0, 5.0, 3.0];
const IMPULSE_AMOUNT: [f64; 5] = [0.03, 0.06, 0.09, 0.17, 0.27];

/// Applies `f` to every subpixel in [0, 1], row-major channel-last order
fn map_subpixels(image: &RgbImage, mut f: impl FnMut(f64) -> Result<f64>) -> Result<RgbImage> {
    let mut out = image.clone();
    for value in out.iter_mut() {
        let noisy = f(*value as f64 / 255.0)?;
        *value = to_u8(noisy as f32);
    }
    Ok(out)
}

/// Additive gaussian noise
pub fn gaussian_noise(image: &RgbImage, severity: Severity, rng: &mut RandomState) -> Result<RgbImage> {
    let sigma = GAUSSIAN_SIGMA[severity.index()];
    let normal = Normal::new(0.0, sigma).map_err(|e| Error::InvalidArgument(e.to_string()))?;
    let rng = rng.general();
    map_subpixels(image, |x| Ok(x + normal.sample(rng)))
}

/// Poisson photon noise; fewer photons per unit intensity at higher severity
pub fn shot_noise(image: &RgbImage, severity: Severity, rng: &mut RandomState) -> Result<RgbImage> {
    let photons = SHOT_PHOTONS[severity.index()];
    let rng = rng.general();
    map_subpixels(image, |x| {
        let lambda = x * photons;
        if lambda <= 0.0 {
            return Ok(0.0);
        }
        let poisson = Poisson::new(lambda).map_err(|e| Error::InvalidArgument(e.to_string()))?;
        let count: f64 = poisson.sample(rng);
        Ok(count / photons)
    })
}

/// Salt-and-pepper noise.
///
/// The flip mask is drawn over every subpixel first, then the salt mask,
/// each as an independent Bernoulli per subpixel.
pub fn impulse_noise(image: &RgbImage, severity: Severity, rng: &mut RandomState) -> Result<RgbImage> {
    let amount = IMPULSE_AMOUNT[severity.index()];
    let rng = rng.general();

    let flipped: Vec<bool> = (0..image.len()).map(|_| rng.gen::<f64>() < amount).collect();
    let salted: Vec<bool> = (0..image.len()).map(|_| rng.gen::<f64>() < 0.5).collect();

    let mut out = image.clone();
    for (i, value) in out.iter_mut().enumerate() {
        if flipped[i] {
            *value = if salted[i] { 255 } else { 0 };
        }
    }
    Ok(out)
}
