//! Deterministic random state for corruption passes.
//!
//! Corruptions never touch a process-wide generator. The caller owns a
//! [`RandomState`] and lends it to a [`DeterministicBatch`], which reseeds it
//! with the fixed batch seeds and puts the general-purpose generator back
//! when the batch ends, however it ends.

use corrupt_core::{GENERAL_SEED, IMAGE_LIBRARY_SEED};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// Pair of generators consumed by the corruption functions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomState {
    general: ChaCha8Rng,
    image_library: ChaCha8Rng,
}

impl RandomState {
    pub fn new(general: ChaCha8Rng, image_library: ChaCha8Rng) -> Self {
        Self {
            general,
            image_library,
        }
    }

    /// Seeds both generators from one value (tests and ad-hoc runs)
    pub fn seed_from_u64(seed: u64) -> Self {
        Self::new(
            ChaCha8Rng::seed_from_u64(seed),
            ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
        )
    }

    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy(), ChaCha8Rng::from_entropy())
    }

    /// General-purpose stream: noise fields, pixel shuffles, fractals, warps
    pub fn general(&mut self) -> &mut ChaCha8Rng {
        &mut self.general
    }

    /// Stream standing in for the image library's internal generator
    pub fn image_library(&mut self) -> &mut ChaCha8Rng {
        &mut self.image_library
    }

    /// Snapshot of the general-purpose generator
    pub fn general_state(&self) -> ChaCha8Rng {
        self.general.clone()
    }

    /// Snapshot of the image-library generator
    pub fn image_library_state(&self) -> ChaCha8Rng {
        self.image_library.clone()
    }
}

/// Scope that runs one full pass under the fixed seeds.
///
/// Only the general-purpose generator is restored on exit. The
/// image-library generator keeps its batch seed and advanced position,
/// because a reseed has no prior state worth restoring and downstream
/// output depends on that behavior.
pub struct DeterministicBatch<'a> {
    state: &'a mut RandomState,
    saved_general: Option<ChaCha8Rng>,
}

impl<'a> DeterministicBatch<'a> {
    /// Saves the general generator and reseeds both generators
    pub fn begin(state: &'a mut RandomState) -> Self {
        let saved_general = state.general.clone();
        state.general = ChaCha8Rng::seed_from_u64(GENERAL_SEED);
        warn!("Overwriting image-library RNG seed with {}", IMAGE_LIBRARY_SEED);
        state.image_library = ChaCha8Rng::seed_from_u64(IMAGE_LIBRARY_SEED);

        Self {
            state,
            saved_general: Some(saved_general),
        }
    }

    /// Random state to hand to corruption calls
    pub fn rng(&mut self) -> &mut RandomState {
        &mut *self.state
    }

    /// Ends the batch now instead of at drop
    pub fn end(self) {}

    fn restore(&mut self) {
        if let Some(saved) = self.saved_general.take() {
            self.state.general = saved;
            debug!("Restored general-purpose RNG state");
        }
    }
}

impl Drop for DeterministicBatch<'_> {
    fn drop(&mut self) {
        self.restore();
    }
}
