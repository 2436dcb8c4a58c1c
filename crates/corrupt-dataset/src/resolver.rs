//! Binds a corruption name and severity to the function that applies it.

use corrupt_core::{CorruptionSpec, Result};
use image::RgbImage;

use crate::corruptions::{corruption_fn, CorruptionFn};
use crate::rng::RandomState;

/// A corruption function together with the severity it runs at
#[derive(Clone, Copy)]
pub struct BoundCorruption {
    spec: CorruptionSpec,
    func: CorruptionFn,
}

impl BoundCorruption {
    pub fn new(spec: CorruptionSpec) -> Self {
        Self {
            spec,
            func: corruption_fn(spec.corruption_type),
        }
    }

    pub fn spec(&self) -> CorruptionSpec {
        self.spec
    }

    /// Corrupts `image` at the bound severity
    pub fn apply(&self, image: &RgbImage, rng: &mut RandomState) -> Result<RgbImage> {
        (self.func)(image, self.spec.severity, rng)
    }
}

impl std::fmt::Debug for BoundCorruption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundCorruption")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Looks up `name` among the twelve corruptions and validates `severity`.
///
/// Fails with `UnknownCorruptionType` or `InvalidSeverity`; has no side effects.
pub fn resolve(name: &str, severity: i64) -> Result<BoundCorruption> {
    Ok(BoundCorruption::new(CorruptionSpec::new(name, severity)?))
}
