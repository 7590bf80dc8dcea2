//! Random sources for randomize and dynamic modulation
//!
//! The mixer never talks to `rand` directly; it draws through
//! [`RandomSource`] so tests can replay a fixed sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform draws in `[0, 1)`
pub trait RandomSource: Send {
    /// Next uniform value in `[0, 1)`
    fn next_unit(&mut self) -> f64;

    /// Uniform integer in `[0, max]`
    fn next_percent(&mut self, max: u8) -> u8 {
        let span = f64::from(max) + 1.0;
        let value = (self.next_unit() * span).floor();
        value.clamp(0.0, f64::from(max)) as u8
    }

    /// Uniform value in `[-depth, depth)`
    fn next_symmetric(&mut self, depth: f64) -> f64 {
        self.next_unit().mul_add(2.0 * depth, -depth)
    }
}

/// Random source backed by a seedable `StdRng`
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Seed from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic source for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for StdRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of draws, cycling when exhausted
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    /// Create a source that yields `values` in order. Values are clamped
    /// into `[0, 1)`; an empty list always yields 0.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { values, cursor: 0 }
    }

    /// Number of draws taken so far
    pub const fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceRandom {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}
