// haptic_core/src/prng.rs

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// The pseudo-random source that drives sensor noise.
///
/// Passed explicitly into every `simulate` call; two runs that start from the
/// same seed and feed the same physics produce identical measurements.
#[derive(Debug, Clone)]
pub struct SensorRng(pub ChaCha8Rng);

impl SensorRng {
    pub fn seeded(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    /// A generator seeded from the operating system, for runs that do not need replay.
    pub fn from_entropy() -> Self {
        Self(ChaCha8Rng::from_entropy())
    }
}

impl Default for SensorRng {
    fn default() -> Self {
        Self::seeded(0)
    }
}
