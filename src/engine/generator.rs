//! Synthetic sample generation
//!
//! Each reading is the channel baseline plus a slow sine trend, a small
//! uniform noise term and an even smaller drift term, rounded to two decimal
//! places:
//!
//! ```text
//! value = baseline + A * sin(now / P) + noise + drift
//! ```
//!
//! The rounded value is what gets stored and compared against limits.
//!
//! # Random Sources
//!
//! Randomness is drawn through the [`RandomSource`] trait so tests can supply
//! a fixed sequence:
//!
//! - [`EntropySource`] - OS-seeded `StdRng` (the default)
//! - [`SequenceSource`] - Replays caller-supplied unit values in a loop
//!
//! # Example
//!
//! ```
//! use tempvis_rs::engine::generator::{SampleGenerator, SequenceSource};
//!
//! let generator = SampleGenerator::default();
//! // 0.5 maps to the midpoint of every uniform range, so noise and drift vanish
//! let mut rng = SequenceSource::new(vec![0.5]);
//! assert_eq!(generator.value_at(21.0, 0, &mut rng), 21.0);
//! ```

use crate::config::GeneratorSettings;
use crate::types::Channel;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform values in `[0, 1)`
pub trait RandomSource: Send {
    /// Next unit value in `[0, 1)`
    fn next_unit(&mut self) -> f64;

    /// Uniform value in `[-half_width, half_width)`
    fn symmetric(&mut self, half_width: f64) -> f64 {
        (self.next_unit() - 0.5) * 2.0 * half_width
    }
}

/// OS-seeded random source
#[derive(Debug)]
pub struct EntropySource {
    rng: StdRng,
}

impl EntropySource {
    /// Seed from the operating system
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seed from a fixed value (reproducible, for benchmarks)
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for EntropySource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropySource {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of unit values, wrapping at the end
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f64>,
    position: usize,
}

impl SequenceSource {
    /// Create a source from values in `[0, 1)`; an empty list yields 0.5 forever
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            position: 0,
        }
    }

    /// A source that always returns 0.5, cancelling every random term
    pub fn midpoint() -> Self {
        Self::new(vec![0.5])
    }

    /// Number of values drawn so far
    pub fn drawn(&self) -> usize {
        self.position
    }
}

impl RandomSource for SequenceSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.5;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value
    }
}

/// Round to two decimal places
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Produces synthetic readings from a channel baseline
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleGenerator {
    settings: GeneratorSettings,
}

impl SampleGenerator {
    /// Create a generator with custom settings
    pub fn new(settings: GeneratorSettings) -> Self {
        Self { settings }
    }

    /// Baseline for the channel created at `index`
    pub fn baseline(&self, index: usize, rng: &mut dyn RandomSource) -> f64 {
        self.settings.baseline_origin
            + self.settings.baseline_step * index as f64
            + rng.symmetric(self.settings.baseline_jitter)
    }

    /// Slow oscillation shared by every channel
    #[inline]
    pub fn trend(&self, now: i64) -> f64 {
        self.settings.trend_amplitude * (now as f64 / self.settings.trend_period()).sin()
    }

    /// Reading for `baseline` at `now`, rounded to two decimals
    pub fn value_at(&self, baseline: f64, now: i64, rng: &mut dyn RandomSource) -> f64 {
        let noise = rng.symmetric(self.settings.noise_amplitude);
        let drift = rng.symmetric(self.settings.drift_amplitude);
        round2(baseline + self.trend(now) + noise + drift)
    }

    /// Next reading for `channel` at `now`
    pub fn next_value(&self, channel: &Channel, now: i64, rng: &mut dyn RandomSource) -> f64 {
        self.value_at(channel.baseline, now, rng)
    }
}
