//! Tunable parameters for sample generation and the tick loop
//!
//! These settings are plain data with defaults matching the dashboard's
//! simulated sensors. They are embedded in [`super::EngineConfig`] and can be
//! overridden from the configuration file.
//!
//! # Main Types
//!
//! - [`GeneratorSettings`] - Baseline, trend, noise, and drift shape
//! - [`BackfillSettings`] - History seeded into a freshly created channel
//! - [`TickSettings`] - Tick period and queue sizes
//! - [`LoggingSettings`] - Log filter and optional log directory
//! - [`ReportSettings`] - Console summary produced by the `tempvis` binary

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default tick period in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Shape of the synthetic readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Baseline of channel 0 before jitter
    pub baseline_origin: f64,
    /// Baseline increase per channel index
    pub baseline_step: f64,
    /// Half-width of the uniform jitter added to the baseline
    pub baseline_jitter: f64,
    /// Amplitude of the slow sine trend
    pub trend_amplitude: f64,
    /// Divisor applied to epoch milliseconds inside the sine
    pub trend_period_ms: f64,
    /// Half-width of the per-sample uniform noise
    pub noise_amplitude: f64,
    /// Half-width of the per-sample uniform drift
    pub drift_amplitude: f64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            baseline_origin: 20.0,
            baseline_step: 2.0,
            baseline_jitter: 2.5,
            trend_amplitude: 2.0,
            trend_period_ms: 10_000.0,
            noise_amplitude: 0.25,
            drift_amplitude: 0.05,
        }
    }
}

impl GeneratorSettings {
    /// Sine divisor, never below 1 ms (`NaN` also maps to 1)
    pub fn trend_period(&self) -> f64 {
        self.trend_period_ms.max(1.0)
    }
}

/// History seeded into a new channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillSettings {
    /// How far back the seeded history reaches
    pub span_ms: i64,
    /// Spacing between seeded samples
    pub spacing_ms: i64,
}

impl Default for BackfillSettings {
    fn default() -> Self {
        Self {
            span_ms: 30_000,
            spacing_ms: DEFAULT_TICK_INTERVAL_MS as i64,
        }
    }
}

impl BackfillSettings {
    /// Sample times from `now - span` up to `now`, ascending
    pub fn times(&self, now: i64) -> impl Iterator<Item = i64> {
        let spacing = self.spacing_ms.max(1);
        let span = self.span_ms.max(0);
        (0..=span / spacing).rev().map(move |step| now - step * spacing)
    }
}

/// Tick loop timing and queue sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickSettings {
    /// Tick period in milliseconds
    pub interval_ms: u64,
    /// How often stats are published, in milliseconds
    pub stats_interval_ms: u64,
    /// Capacity of the command queue
    pub command_buffer_size: usize,
    /// Capacity of the outgoing message queue
    pub message_buffer_size: usize,
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_TICK_INTERVAL_MS,
            stats_interval_ms: 1_000,
            command_buffer_size: 256,
            message_buffer_size: 1024,
        }
    }
}

impl TickSettings {
    /// Tick period, never shorter than 1 ms
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    /// Stats publication period
    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms.max(1))
    }
}

/// Channels created at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    /// Number of channels created when the engine starts
    pub initial_count: usize,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self { initial_count: 1 }
    }
}

/// Logging configuration for the binary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: Option<String>,
    /// Directory for daily-rolling log files; console only when unset
    pub directory: Option<PathBuf>,
}

/// Console summary produced by the `tempvis` binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Period between summaries in milliseconds
    pub interval_ms: u64,
    /// Print each snapshot as JSON instead of a summary line
    pub json: bool,
    /// Stop after this many seconds; run until killed when unset
    pub duration_secs: Option<u64>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            json: false,
            duration_secs: None,
        }
    }
}
