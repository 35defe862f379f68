//! Random sources
//!
//! This module defines the `RandomSource` trait consumed by K-means
//! initialization, with a thread-RNG source and a seeded source for
//! reproducible runs.

pub mod pseudo;

use crate::error::Result;

/// Trait for uniform random number sources
///
/// Implementations must be thread-safe (Send + Sync) to work with the async
/// server.
pub trait RandomSource: Send + Sync {
    /// Returns the source name (e.g., "pseudo", "seeded")
    fn name(&self) -> &'static str;

    /// Generate n random floats, each uniformly distributed in [0.0, 1.0)
    fn floats(&self, n: usize) -> Result<Vec<f64>>;

    /// Generate a single random float uniformly distributed in [0.0, 1.0)
    fn float(&self) -> Result<f64> {
        self.floats(1)?
            .first()
            .copied()
            .ok_or_else(|| crate::error::Error::Random("source returned no values".to_string()))
    }

    /// Draw `count` indices uniformly from `0..len`, with replacement
    ///
    /// Returns an empty vector when `len` is 0.
    fn indices(&self, count: usize, len: usize) -> Result<Vec<usize>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let floats = self.floats(count)?;
        Ok(floats
            .into_iter()
            .map(|u| ((u * len as f64) as usize).min(len - 1))
            .collect())
    }
}

/// Get a random source, seeded when a seed is given
pub fn get_source(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(pseudo::SeededSource::new(seed)),
        None => Box::new(pseudo::PseudoSource::new()),
    }
}
