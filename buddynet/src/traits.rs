//! Randomness abstraction used by the protocols and the simulator.
//!
//! The RNG is a capability threaded explicitly through construction and
//! every tick: the draw order is part of the deterministic schedule, so no
//! ambient randomness is allowed anywhere in the protocol code.

/// Random number generation trait.
pub trait Random {
    /// Generate a random u64 in the range [min, max).
    ///
    /// An empty range returns `min`.
    fn gen_range(&mut self, min: u64, max: u64) -> u64;

    /// Draw a uniform index into a slice of the given length.
    ///
    /// Length 0 returns 0; callers must guard against empty slices.
    fn gen_index(&mut self, len: usize) -> usize {
        self.gen_range(0, len as u64) as usize
    }
}

/// Test/simulation implementations of [`Random`].
pub mod test_impls {
    use super::Random;

    /// Deterministic LCG for tests.
    pub struct MockRandom {
        pub state: u64,
    }

    impl Default for MockRandom {
        fn default() -> Self {
            Self { state: 12345 }
        }
    }

    impl MockRandom {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_seed(seed: u64) -> Self {
            Self { state: seed }
        }
    }

    impl Random for MockRandom {
        fn gen_range(&mut self, min: u64, max: u64) -> u64 {
            self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let range = max.saturating_sub(min);
            if range == 0 {
                return min;
            }
            min + (self.state % range)
        }
    }

    /// Scripted RNG that replays a fixed sequence of draws, then falls back
    /// to an LCG. Useful for forcing exact loss patterns in tests.
    pub struct ScriptedRandom {
        script: Vec<u64>,
        cursor: usize,
        fallback: MockRandom,
    }

    impl ScriptedRandom {
        pub fn new(script: Vec<u64>) -> Self {
            Self {
                script,
                cursor: 0,
                fallback: MockRandom::new(),
            }
        }
    }

    impl Random for ScriptedRandom {
        fn gen_range(&mut self, min: u64, max: u64) -> u64 {
            let range = max.saturating_sub(min);
            if range == 0 {
                return min;
            }
            if let Some(&value) = self.script.get(self.cursor) {
                self.cursor += 1;
                min + (value % range)
            } else {
                self.fallback.gen_range(min, max)
            }
        }
    }
}
