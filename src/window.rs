//! Fixed-capacity sample window
//!
//! [`SampleWindow`] is a ring buffer over a preallocated arena. Appending to a
//! full window overwrites the oldest slot and advances the head, so both
//! append and eviction are O(1).
//!
//! Samples are kept in non-decreasing `time` order: a sample older than the
//! newest stored one is clamped to the newest time before it is stored.

use crate::types::{Sample, MAX_WINDOW};
use serde::ser::{Serialize, Serializer};

/// How often to recompute the running sum exactly (every N evictions)
const STATS_RECALC_INTERVAL: u32 = 1000;

/// Ring buffer of samples, oldest first
#[derive(Debug, Clone)]
pub struct SampleWindow {
    /// Backing storage, grows up to `capacity` and is then reused
    slots: Vec<Sample>,
    /// Index of the oldest sample once the arena is full
    head: usize,
    capacity: usize,
    /// Running sum of values for O(1) averages
    sum: f64,
    evictions_since_recalc: u32,
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleWindow {
    /// Create a window holding up to [`MAX_WINDOW`] samples
    pub fn new() -> Self {
        Self::with_capacity(MAX_WINDOW)
    }

    /// Create a window with a custom capacity (at least 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
            capacity,
            sum: 0.0,
            evictions_since_recalc: 0,
        }
    }

    /// Append a sample, returning the evicted oldest sample if the window was full
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        let sample = match self.last() {
            Some(newest) if sample.time < newest.time => {
                tracing::debug!(
                    "Clamping out-of-order sample at {} to {}",
                    sample.time,
                    newest.time
                );
                Sample::new(newest.time, sample.value)
            }
            _ => sample,
        };

        self.sum += sample.value;

        if self.slots.len() < self.capacity {
            self.slots.push(sample);
            return None;
        }

        let evicted = std::mem::replace(&mut self.slots[self.head], sample);
        self.head = (self.head + 1) % self.capacity;
        self.sum -= evicted.value;

        self.evictions_since_recalc += 1;
        if self.evictions_since_recalc >= STATS_RECALC_INTERVAL {
            self.evictions_since_recalc = 0;
            self.sum = self.iter().map(|s| s.value).sum();
        }

        Some(evicted)
    }

    /// Number of stored samples
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no samples are stored
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns true once appends start evicting
    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    /// Get the sample at logical position `index` (0 = oldest)
    pub fn get(&self, index: usize) -> Option<&Sample> {
        if index >= self.slots.len() {
            return None;
        }
        self.slots.get((self.head + index) % self.slots.len())
    }

    /// Get the oldest sample
    pub fn first(&self) -> Option<&Sample> {
        self.get(0)
    }

    /// Get the newest sample
    pub fn last(&self) -> Option<&Sample> {
        self.slots.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Iterate samples oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> + '_ {
        let (wrapped, front) = self.slots.split_at(self.head);
        front.iter().chain(wrapped.iter())
    }

    /// Remove all samples
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
        self.sum = 0.0;
        self.evictions_since_recalc = 0;
    }

    /// Get samples as plot points (time in ms, value)
    pub fn as_plot_points(&self) -> Vec<[f64; 2]> {
        self.iter().map(|s| [s.time as f64, s.value]).collect()
    }

    /// Get the time range of the window
    pub fn time_range(&self) -> Option<(i64, i64)> {
        Some((self.first()?.time, self.last()?.time))
    }

    /// Get the value of the sample at exactly `time`, if any
    pub fn value_at(&self, time: i64) -> Option<f64> {
        self.iter().find(|s| s.time == time).map(|s| s.value)
    }

    /// Summary statistics over the window
    pub fn stats(&self) -> WindowStats {
        let Some(current) = self.last().map(|s| s.value) else {
            return WindowStats::default();
        };

        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for sample in self.iter() {
            min = min.min(sample.value);
            max = max.max(sample.value);
        }

        let previous = self.len().checked_sub(2).and_then(|i| self.get(i)).map(|s| s.value);
        let change_percent = match previous {
            Some(prev) if prev != 0.0 => (current - prev) / prev * 100.0,
            _ => 0.0,
        };

        WindowStats {
            count: self.len(),
            current,
            change_percent,
            average: self.sum / self.len() as f64,
            min,
            max,
        }
    }
}

impl Serialize for SampleWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'a> IntoIterator for &'a SampleWindow {
    type Item = &'a Sample;
    type IntoIter = Box<dyn DoubleEndedIterator<Item = &'a Sample> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Summary of the values held in a window
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStats {
    /// Number of samples summarized
    pub count: usize,
    /// Newest value
    pub current: f64,
    /// Percent change from the previous sample (0 without a nonzero previous)
    pub change_percent: f64,
    /// Mean value
    pub average: f64,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
}
