//! Injectable randomness.
//!
//! Failure draws and SEO stub values go through [`RandomSource`] so tests
//! can pin them.

use rand::Rng;

pub trait RandomSource: Send + Sync {
    /// Uniform sample in `[0, 1)`.
    fn unit(&self) -> f64;

    /// Uniform integer in `[0, upper)`. `upper` must be non-zero.
    fn below(&self, upper: u64) -> u64;

    /// True with probability `p`.
    fn chance(&self, p: f64) -> bool {
        self.unit() < p
    }
}

/// Thread-local RNG from `rand`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }

    fn below(&self, upper: u64) -> u64 {
        rand::rng().random_range(0..upper)
    }
}

/// Always returns the same draws.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom {
    pub fraction: f64,
    pub index: u64,
}

#[cfg(test)]
impl FixedRandom {
    pub fn never_fails() -> Self {
        Self {
            fraction: 0.999,
            index: 0,
        }
    }

    pub fn fails_at(index: u64) -> Self {
        Self {
            fraction: 0.0,
            index,
        }
    }
}

#[cfg(test)]
impl RandomSource for FixedRandom {
    fn unit(&self) -> f64 {
        self.fraction
    }

    fn below(&self, upper: u64) -> u64 {
        self.index.min(upper.saturating_sub(1))
    }
}
