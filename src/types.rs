//! Core data types for TempVis-RS
//!
//! This module contains the fundamental data structures used throughout
//! the engine for representing channels, samples, and their limits.
//!
//! # Main Types
//!
//! - [`Sample`] - A single timestamped reading
//! - [`ThresholdConfig`] - High/low limits for a channel
//! - [`LimitStatus`] - Result of evaluating a channel against its limits
//! - [`Channel`] - One simulated sensor with its rolling history
//! - [`EngineStats`] - Runtime statistics about the tick loop
//!
//! # Memory Management
//!
//! Channel history is stored in a [`SampleWindow`] ring buffer with a fixed
//! capacity of [`MAX_WINDOW`] samples. When the buffer is full, the oldest
//! sample is evicted automatically.

use crate::window::{SampleWindow, WindowStats};
use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};

/// Maximum number of samples retained per channel
pub const MAX_WINDOW: usize = 300;

/// A single reading with its capture time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// ISO-8601 rendering of `time`, for display only
    pub timestamp: String,
    /// Milliseconds since the Unix epoch
    pub time: i64,
    /// The reading
    pub value: f64,
}

impl Sample {
    /// Create a sample, deriving the display timestamp from `time`
    pub fn new(time: i64, value: f64) -> Self {
        Self {
            timestamp: format_timestamp(time),
            time,
            value,
        }
    }
}

/// Render epoch milliseconds as `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn format_timestamp(time_ms: i64) -> String {
    DateTime::from_timestamp_millis(time_ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// High/low limits for a channel
///
/// `high` and `low` only matter while `enabled` is set. Ordering between them
/// is not validated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Whether limits are evaluated at all
    pub enabled: bool,
    /// Upper limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    /// Lower limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
}

impl ThresholdConfig {
    /// Limits switched off
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Enabled limits with optional bounds
    pub fn enabled(high: Option<f64>, low: Option<f64>) -> Self {
        Self {
            enabled: true,
            high,
            low,
        }
    }

    /// Set the upper limit
    pub fn with_high(mut self, high: f64) -> Self {
        self.high = Some(high);
        self
    }

    /// Set the lower limit
    pub fn with_low(mut self, low: f64) -> Self {
        self.low = Some(low);
        self
    }
}

/// Breach classification of a channel's current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitStatus {
    /// No breach (or limits disabled)
    #[default]
    None,
    /// Current value above the high limit
    High,
    /// Current value below the low limit
    Low,
}

impl LimitStatus {
    /// Returns true for `High` and `Low`
    pub fn is_breach(&self) -> bool {
        !matches!(self, LimitStatus::None)
    }
}

impl std::fmt::Display for LimitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitStatus::None => write!(f, "ok"),
            LimitStatus::High => write!(f, "HIGH"),
            LimitStatus::Low => write!(f, "LOW"),
        }
    }
}

/// Badge shown next to a channel in a selector list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitBadge {
    /// Limits disabled
    Unlimited,
    /// Limits enabled and not breached
    Armed,
    /// High limit breached
    High,
    /// Low limit breached
    Low,
}

impl std::fmt::Display for LimitBadge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitBadge::Unlimited => write!(f, ""),
            LimitBadge::Armed => write!(f, "LIMITED"),
            LimitBadge::High => write!(f, "HIGH"),
            LimitBadge::Low => write!(f, "LOW"),
        }
    }
}

/// One simulated temperature sensor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Unique identifier, stable for the channel's lifetime
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Longer description
    pub description: String,
    /// Display color hint (CSS color string)
    pub color: String,
    /// Unit label for display (e.g., "°C")
    pub unit: Option<String>,
    /// Fixed value the generator oscillates around
    pub baseline: f64,
    /// Value of the newest sample, or the baseline before any sample
    pub current_value: f64,
    /// Time of the newest sample in epoch milliseconds
    pub last_update_time: i64,
    /// Rolling sample history, oldest first
    pub history: SampleWindow,
    /// Limits evaluated against `current_value`
    pub thresholds: ThresholdConfig,
}

impl Channel {
    /// Create a channel with an empty history
    pub fn new(id: impl Into<String>, name: impl Into<String>, baseline: f64, now: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            color: String::new(),
            unit: None,
            baseline,
            current_value: baseline,
            last_update_time: now,
            history: SampleWindow::new(),
            thresholds: ThresholdConfig::default(),
        }
    }

    /// Id used for the channel created at `index`
    pub fn id_for(index: usize) -> String {
        format!("channel_{}", index)
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the display color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the unit label
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the thresholds
    pub fn with_thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Color for the channel at `index`, spreading hues 23 degrees apart
    pub fn color_for(index: usize) -> String {
        format!("hsl({}, 70%, 50%)", (index * 23) % 360)
    }

    /// Get the newest sample
    pub fn last(&self) -> Option<&Sample> {
        self.history.last()
    }

    /// Summary statistics over the retained window
    pub fn stats(&self) -> WindowStats {
        self.history.stats()
    }
}

/// State of the engine worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EngineState {
    /// Ticking on schedule
    #[default]
    Running,
    /// Accepting commands but not ticking
    Paused,
    /// Worker loop has exited
    Stopped,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Running => write!(f, "Running"),
            EngineState::Paused => write!(f, "Paused"),
            EngineState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Statistics about the tick loop
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStats {
    /// Number of completed ticks
    pub ticks: u64,
    /// Number of channels in the last published snapshot
    pub channel_count: usize,
    /// Average tick computation time in microseconds
    pub avg_tick_time_us: f64,
    /// Longest tick computation time in microseconds
    pub max_tick_time_us: u64,
    /// Ticks per second measured over the last stats interval
    pub effective_tick_rate: f64,
    /// Number of messages dropped due to queue backpressure
    pub dropped_messages: u64,
    /// Number of commands rejected with an error
    pub rejected_commands: u64,
}

impl EngineStats {
    /// Fold one tick duration into the running average
    pub fn record_tick(&mut self, elapsed_us: u64) {
        self.ticks += 1;
        self.max_tick_time_us = self.max_tick_time_us.max(elapsed_us);
        let n = self.ticks as f64;
        self.avg_tick_time_us += (elapsed_us as f64 - self.avg_tick_time_us) / n;
    }
}
