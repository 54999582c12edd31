//! Random number generator abstraction for determinism.
//!
//! Scenes receive a boxed [`DeterministicRng`] so that shuffles, puzzle
//! scrambles and reveal effects can be replayed from a seed in tests.

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Abstraction over random number generation.
pub trait DeterministicRng {
    /// Generate a uniformly distributed index in `[0, bound)`. `bound` must be
    /// non-zero.
    fn next_index(&mut self, bound: usize) -> usize;

    /// Generate a random `f64` in `[0.0, 1.0)`.
    fn next_f64(&mut self) -> f64;

    /// Generate a random `f64` in `[min, max)`.
    fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }
}

/// Production RNG backed by [`StdRng`].
#[derive(Debug, Clone)]
pub struct StdDeterministicRng {
    inner: StdRng,
}

impl StdDeterministicRng {
    /// Seeds from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            inner: StdRng::from_os_rng(),
        }
    }

    /// Reproducible generator for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl DeterministicRng for StdDeterministicRng {
    fn next_index(&mut self, bound: usize) -> usize {
        self.inner.random_range(0..bound)
    }

    fn next_f64(&mut self) -> f64 {
        self.inner.random::<f64>()
    }
}

/// Uniform in-place Fisher-Yates shuffle.
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn DeterministicRng) {
    for i in (1..items.len()).rev() {
        let j = rng.next_index(i + 1);
        items.swap(i, j);
    }
}

/// Hands out generators for each mounted component. With a seed, every
/// generator is derived from it so whole runs replay identically.
#[derive(Debug)]
pub struct RngFactory {
    seed: Option<u64>,
    issued: std::cell::Cell<u64>,
}

impl RngFactory {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed,
            issued: std::cell::Cell::new(0),
        }
    }

    pub fn make(&self) -> Box<dyn DeterministicRng> {
        match self.seed {
            Some(seed) => {
                let n = self.issued.get();
                self.issued.set(n + 1);
                Box::new(StdDeterministicRng::seeded(
                    seed.wrapping_add(n.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
                ))
            }
            None => Box::new(StdDeterministicRng::from_entropy()),
        }
    }
}
