//! Seedable RNG for simulation runs.

use buddynet::Random;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default RNG for the simulator, backed by a seeded [`StdRng`].
///
/// The draw order is part of the deterministic schedule: two simulators
/// built with the same config and seed produce identical runs.
pub struct SimRandom {
    rng: StdRng,
}

impl SimRandom {
    /// Create an RNG from an explicit seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create an RNG seeded from OS entropy, for non-reproducible runs.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Random for SimRandom {
    fn gen_range(&mut self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..max)
    }
}
