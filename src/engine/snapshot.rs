//! Immutable registry snapshots and their publication
//!
//! The worker is the only writer of channel state. After every mutation it
//! builds a [`RegistrySnapshot`] and swaps it into a [`SnapshotCell`]; readers
//! load the latest `Arc` without locking and never see a half-applied tick.

use super::limits::{check_limits, limit_badge};
use crate::error::Result;
use crate::types::{format_timestamp, Channel, LimitBadge, LimitStatus};
use crate::window::WindowStats;
use arc_swap::ArcSwap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Default number of rows produced for a chart
pub const DEFAULT_CHART_ROWS: usize = 100;

/// Point-in-time copy of every channel
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    /// Incremented on every publication
    pub generation: u64,
    /// Time of the tick this snapshot reflects
    pub tick_time: Option<i64>,
    /// Channels in registry order
    pub channels: Vec<Channel>,
}

/// Per-channel summary for a selector list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
    pub current_value: f64,
    pub status: LimitStatus,
    pub badge: LimitBadge,
    pub stats: WindowStats,
}

/// One row of time-aligned values for a multi-channel chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRow {
    pub time: i64,
    pub timestamp: String,
    /// `(channel id, value)` in selection order
    pub values: Vec<(String, f64)>,
}

impl RegistrySnapshot {
    /// Create a snapshot
    pub fn new(generation: u64, tick_time: Option<i64>, channels: Vec<Channel>) -> Self {
        Self {
            generation,
            tick_time,
            channels,
        }
    }

    /// Get a channel by id
    pub fn get(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns true if the snapshot holds no channels
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Limit status of every channel
    pub fn statuses(&self) -> Vec<(String, LimitStatus)> {
        self.channels
            .iter()
            .map(|c| (c.id.clone(), check_limits(c)))
            .collect()
    }

    /// Selector-list summary of every channel
    pub fn summaries(&self) -> Vec<ChannelSummary> {
        self.channels
            .iter()
            .map(|c| ChannelSummary {
                id: c.id.clone(),
                name: c.name.clone(),
                current_value: c.current_value,
                status: check_limits(c),
                badge: limit_badge(c),
                stats: c.stats(),
            })
            .collect()
    }

    /// Merge the selected channels onto a shared time axis
    ///
    /// The axis is the union of sample times across the selection, keeping the
    /// newest `max_rows`. A channel without a sample at a row's time reports 0.
    /// Unknown ids are skipped.
    pub fn aligned_rows<S: AsRef<str>>(&self, ids: &[S], max_rows: usize) -> Vec<AlignedRow> {
        let selected: Vec<&Channel> = ids.iter().filter_map(|id| self.get(id.as_ref())).collect();
        if selected.is_empty() {
            return Vec::new();
        }

        let times: BTreeSet<i64> = selected
            .iter()
            .flat_map(|c| c.history.iter().map(|s| s.time))
            .collect();
        let skip = times.len().saturating_sub(max_rows);

        times
            .into_iter()
            .skip(skip)
            .map(|time| AlignedRow {
                time,
                timestamp: format_timestamp(time),
                values: selected
                    .iter()
                    .map(|c| (c.id.clone(), c.history.value_at(time).unwrap_or(0.0)))
                    .collect(),
            })
            .collect()
    }

    /// Serialize as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Single-writer, multi-reader holder of the latest snapshot
#[derive(Debug)]
pub struct SnapshotCell {
    current: ArcSwap<RegistrySnapshot>,
}

impl SnapshotCell {
    /// Create a cell holding `initial`
    pub fn new(initial: RegistrySnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Latest published snapshot
    pub fn load(&self) -> Arc<RegistrySnapshot> {
        self.current.load_full()
    }

    /// Replace the published snapshot
    pub fn publish(&self, snapshot: RegistrySnapshot) {
        self.current.store(Arc::new(snapshot));
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new(RegistrySnapshot::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sample, ThresholdConfig};

    fn channel(id: &str, samples: &[(i64, f64)]) -> Channel {
        let mut channel = Channel::new(id, id, 20.0, 0);
        for &(time, value) in samples {
            channel.history.push(Sample::new(time, value));
            channel.current_value = value;
        }
        channel
    }

    #[test]
    fn test_aligned_rows_fill_missing_with_zero() {
        let snapshot = RegistrySnapshot::new(
            1,
            Some(300),
            vec![
                channel("a", &[(100, 1.0), (200, 2.0)]),
                channel("b", &[(200, 5.0), (300, 6.0)]),
            ],
        );

        let rows = snapshot.aligned_rows(&["a", "b"], DEFAULT_CHART_ROWS);
        let times: Vec<i64> = rows.iter().map(|r| r.time).collect();
        assert_eq!(times, vec![100, 200, 300]);
        assert_eq!(rows[0].values, vec![("a".to_string(), 1.0), ("b".to_string(), 0.0)]);
        assert_eq!(rows[2].values, vec![("a".to_string(), 0.0), ("b".to_string(), 6.0)]);
        assert_eq!(rows[1].timestamp, "1970-01-01T00:00:00.200Z");
    }

    #[test]
    fn test_aligned_rows_keep_newest() {
        let samples: Vec<(i64, f64)> = (0..10).map(|i| (i * 100, i as f64)).collect();
        let snapshot = RegistrySnapshot::new(1, None, vec![channel("a", &samples)]);
        let rows = snapshot.aligned_rows(&["a"], 3);
        let times: Vec<i64> = rows.iter().map(|r| r.time).collect();
        assert_eq!(times, vec![700, 800, 900]);
    }

    #[test]
    fn test_aligned_rows_empty_or_unknown_selection() {
        let snapshot = RegistrySnapshot::new(1, None, vec![channel("a", &[(0, 1.0)])]);
        let none: [&str; 0] = [];
        assert!(snapshot.aligned_rows(&none, 10).is_empty());
        assert!(snapshot.aligned_rows(&["zzz"], 10).is_empty());
    }

    #[test]
    fn test_summaries() {
        let mut hot = channel("hot", &[(0, 10.0), (100, 40.0)]);
        hot.thresholds = ThresholdConfig::enabled(Some(35.0), None);
        let snapshot = RegistrySnapshot::new(2, Some(100), vec![hot]);

        let summary = &snapshot.summaries()[0];
        assert_eq!(summary.status, LimitStatus::High);
        assert_eq!(summary.badge, LimitBadge::High);
        assert_eq!(summary.stats.max, 40.0);
        assert_eq!(summary.stats.change_percent, 300.0);
    }

    #[test]
    fn test_cell_publish_replaces_snapshot() {
        let cell = SnapshotCell::default();
        let before = cell.load();
        cell.publish(RegistrySnapshot::new(7, Some(1), vec![channel("a", &[])]));
        assert_eq!(before.generation, 0);
        assert_eq!(cell.load().generation, 7);
        assert_eq!(cell.load().len(), 1);
    }

    #[test]
    fn test_json_uses_camel_case() {
        let snapshot = RegistrySnapshot::new(3, Some(100), vec![channel("a", &[(100, 1.5)])]);
        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(json["generation"], 3);
        assert_eq!(json["tickTime"], 100);
        assert_eq!(json["channels"][0]["currentValue"], 1.5);
        assert_eq!(json["channels"][0]["history"][0]["timestamp"], "1970-01-01T00:00:00.100Z");
    }
}
