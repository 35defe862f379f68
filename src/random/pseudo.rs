//! Pseudo-random sources
//!
//! `PseudoSource` draws from rand's thread-local RNG and is not
//! reproducible. `SeededSource` wraps a seeded `StdRng` so the same seed
//! always yields the same sequence.

use crate::error::{Error, Result};
use crate::random::RandomSource;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Non-deterministic source backed by the thread RNG
#[derive(Debug, Default)]
pub struct PseudoSource;

impl PseudoSource {
    /// Create a new pseudo-random source
    pub fn new() -> Self {
        Self
    }
}

impl RandomSource for PseudoSource {
    fn name(&self) -> &'static str {
        "pseudo"
    }

    fn floats(&self, n: usize) -> Result<Vec<f64>> {
        let mut rng = rand::thread_rng();
        Ok((0..n).map(|_| rng.gen::<f64>()).collect())
    }
}

/// Seeded source for deterministic runs and tests
pub struct SeededSource {
    rng: Mutex<rand::rngs::StdRng>,
}

impl SeededSource {
    /// Create a new seeded source
    ///
    /// Using the same seed will produce the same sequence of random values.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(rand::rngs::StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededSource {
    fn name(&self) -> &'static str {
        "seeded"
    }

    fn floats(&self, n: usize) -> Result<Vec<f64>> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| Error::Random("seeded RNG lock poisoned".to_string()))?;
        Ok((0..n).map(|_| rng.gen::<f64>()).collect())
    }
}
