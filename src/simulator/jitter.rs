//! Randomness sources for the daily float amount.
//!
//! The simulator never draws random numbers itself; it asks an injected
//! [`AmountJitter`] for a scaling factor each day so runs can be made fully
//! deterministic in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lower bound of the default spend jitter.
pub const JITTER_LOW: f64 = 0.85;
/// Upper bound of the default spend jitter.
pub const JITTER_HIGH: f64 = 1.15;

/// Supplies the per-day multiplier applied to the daily spend.
pub trait AmountJitter: Send {
    fn next_factor(&mut self) -> f64;
}

/// Uniform draw in `[0.85, 1.15]`.
pub struct UniformJitter {
    rng: StdRng,
}

impl UniformJitter {
    /// Reproducible draws from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Fresh OS entropy; differs on every run.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seeded when `seed` is set, entropy otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::seeded(s),
            None => Self::from_entropy(),
        }
    }
}

impl AmountJitter for UniformJitter {
    fn next_factor(&mut self) -> f64 {
        self.rng.random_range(JITTER_LOW..=JITTER_HIGH)
    }
}

/// Always returns the same factor. `FixedJitter(1.0)` disables jitter.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl AmountJitter for FixedJitter {
    fn next_factor(&mut self) -> f64 {
        self.0
    }
}
