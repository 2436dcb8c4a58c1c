//! The twelve image corruptions.
//!
//! Every corruption has the same shape: it takes an RGB image, a severity
//! and the batch random state, and returns a new image of identical size.
//! Work happens on `f32` values in [0, 1]; results are clipped and rounded
//! half-to-even back to 8 bits.
//!
//! | Family | Corruptions |
//! |---|---|
//! | noise | gaussian, shot, impulse |
//! | blur | defocus, frosted glass, zoom |
//! | weather | fog |
//! | photometric | brightness, contrast |
//! | geometric | elastic, pixelate |
//! | compression | jpeg |

pub(crate) mod filters;
pub(crate) mod resample;

pub mod blur;
pub mod compression;
pub mod geometric;
pub mod noise;
pub mod photometric;
pub mod weather;

use corrupt_core::{CorruptionType, Result, Severity};
use image::RgbImage;

use crate::rng::RandomState;

pub use blur::{defocus_blur, frosted_glass_blur, zoom_blur};
pub use compression::jpeg_compression;
pub use geometric::{elastic, pixelate};
pub use noise::{gaussian_noise, impulse_noise, shot_noise};
pub use photometric::{brightness, contrast};
pub use weather::fog;

/// Signature shared by every corruption
pub type CorruptionFn = fn(&RgbImage, Severity, &mut RandomState) -> Result<RgbImage>;

/// Function implementing `corruption_type`
pub fn corruption_fn(corruption_type: CorruptionType) -> CorruptionFn {
    match corruption_type {
        CorruptionType::GaussianNoise => gaussian_noise,
        CorruptionType::ShotNoise => shot_noise,
        CorruptionType::ImpulseNoise => impulse_noise,
        CorruptionType::DefocusBlur => defocus_blur,
        CorruptionType::FrostedGlassBlur => frosted_glass_blur,
        CorruptionType::ZoomBlur => zoom_blur,
        CorruptionType::Fog => fog,
        CorruptionType::Brightness => brightness,
        CorruptionType::Contrast => contrast,
        CorruptionType::Elastic => elastic,
        CorruptionType::Pixelate => pixelate,
        CorruptionType::JpegCompression => jpeg_compression,
    }
}
