//! The process-wide RNG port.
//!
//! The core depends on a narrow `RandomNumberGenerator` trait rather than a
//! concrete generator so that a fixed-random-value override (used for
//! regression testing, `--fixed-random-value`) is indistinguishable from a
//! real stream to every module. `ChaChaRng` backs the default implementation
//! because it is a reproducible, non-cryptographic-strength-required PRNG
//! with deterministic sub-stream derivation from a seed and index — exactly
//! what parallel iterations need to stay reproducible regardless of
//! execution order.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Narrow RNG port the simulation engine depends on. `u01` is the only
/// primitive every module needs; richer sampling (distributions) lives
/// behind [`crate::ports::distribution`].
pub trait RandomNumberGenerator: Send {
    /// Draw from `U[0, 1)`.
    fn u01(&mut self) -> f64;

    /// Draw a uniform index in `[0, len)`. Used by the event queue to pick a
    /// uniformly-random element of the current wave.
    fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.u01() * len as f64) as usize
    }
}

/// Default RNG: a seeded ChaCha8 stream, or a constant value when a
/// fixed-random-value override is configured.
pub enum DefaultRng {
    Seeded(ChaCha8Rng),
    Fixed(f64),
}

impl DefaultRng {
    pub fn seeded(seed: u64) -> Self {
        Self::Seeded(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn fixed(value: f64) -> Self {
        debug_assert!((0.0..1.0).contains(&value));
        Self::Fixed(value)
    }

    /// Derives a reproducible sub-stream for iteration `iteration_index` of a
    /// run seeded with `master_seed`. Parallel iterations each use a
    /// sub-stream derived deterministically from the master seed and
    /// iteration index, so results never depend on scheduling order.
    pub fn sub_stream(master_seed: u64, iteration_index: u64) -> Self {
        // ChaCha8's `set_stream` gives each iteration an independent stream
        // from the same seed, so results don't depend on execution order.
        let mut rng = ChaCha8Rng::seed_from_u64(master_seed);
        rng.set_stream(iteration_index);
        Self::Seeded(rng)
    }
}

impl RandomNumberGenerator for DefaultRng {
    fn u01(&mut self) -> f64 {
        match self {
            Self::Seeded(rng) => rng.random_range(0.0..1.0),
            Self::Fixed(value) => *value,
        }
    }
}
