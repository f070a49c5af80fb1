//! Random sources for stochastic rule selection and ring jitter.
//!
//! Every consumer takes `&mut dyn RandomSource`, so a run is reproducible by
//! handing in a [`SeededRandom`] with a fixed seed, or fully scripted with
//! [`ScriptedRandom`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Capability to draw uniform floats.
pub trait RandomSource {
    /// Uniform value in `[min, max)`. Returns `min` when the range is empty.
    fn range(&mut self, min: f32, max: f32) -> f32;
}

/// Deterministic source backed by `StdRng`.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::new(42)
    }
}

impl RandomSource for SeededRandom {
    fn range(&mut self, min: f32, max: f32) -> f32 {
        if !(max > min) {
            return min;
        }
        self.rng.gen_range(min..max)
    }
}

/// Largest scripted fraction, so a draw never reaches the range maximum.
const LAST_FRACTION: f32 = 1.0 - f32::EPSILON;

/// Replays fractions of `[0, 1)` in a loop, mapping each onto the requested
/// range. Values outside are clamped into it. An empty script always yields
/// the range minimum.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    fractions: Vec<f32>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(fractions: impl IntoIterator<Item = f32>) -> Self {
        Self {
            fractions: fractions.into_iter().map(|f| f.clamp(0.0, LAST_FRACTION)).collect(),
            cursor: 0,
        }
    }

    /// Always returns the middle of the requested range.
    pub fn midpoint() -> Self {
        Self::new([0.5])
    }
}

impl RandomSource for ScriptedRandom {
    fn range(&mut self, min: f32, max: f32) -> f32 {
        if self.fractions.is_empty() {
            return min;
        }
        let t = self.fractions[self.cursor % self.fractions.len()];
        self.cursor += 1;
        min + (max - min) * t
    }
}
