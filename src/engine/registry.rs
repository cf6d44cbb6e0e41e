//! Channel registry
//!
//! The registry owns every live channel in insertion order and applies the
//! tick cycle to all of them. It has no notion of which channels are
//! displayed; selection belongs to the presentation layer.
//!
//! Tick times are forced to be non-decreasing: a `now` earlier than the
//! previous tick is raised to the previous tick time.

use super::generator::{RandomSource, SampleGenerator};
use super::limits::check_limits;
use super::snapshot::RegistrySnapshot;
use crate::error::{EngineError, Result};
use crate::types::{Channel, LimitStatus, Sample, ThresholdConfig};
use std::collections::HashSet;

/// Push `sample` into the channel's window and update its current value
pub fn append_sample(channel: &mut Channel, sample: Sample) {
    channel.history.push(sample);
    if let Some(stored) = channel.history.last() {
        channel.current_value = stored.value;
        channel.last_update_time = stored.time;
    }
}

/// Ordered collection of channels keyed by id
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channels: Vec<Channel>,
    generator: SampleGenerator,
    last_tick: Option<i64>,
}

impl ChannelRegistry {
    /// Create an empty registry using the default generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with a custom generator
    pub fn with_generator(generator: SampleGenerator) -> Self {
        Self {
            generator,
            ..Default::default()
        }
    }

    /// Append a channel; fails if its id is already registered
    pub fn add(&mut self, channel: Channel) -> Result<()> {
        if self.contains(&channel.id) {
            return Err(EngineError::DuplicateId(channel.id));
        }
        tracing::debug!("Registered {}", channel.id);
        self.channels.push(channel);
        Ok(())
    }

    /// Remove every channel whose id is in `ids`, returning the removed ids
    ///
    /// Unknown ids are ignored.
    pub fn remove<I, S>(&mut self, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted: HashSet<String> = ids.into_iter().map(|id| id.as_ref().to_string()).collect();
        let mut removed = Vec::new();
        self.channels.retain(|channel| {
            if wanted.contains(&channel.id) {
                removed.push(channel.id.clone());
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            tracing::debug!("Removed channels {:?}", removed);
        }
        removed
    }

    /// Replace the thresholds of channel `id`
    pub fn update_thresholds(&mut self, id: &str, thresholds: ThresholdConfig) -> Result<()> {
        let channel = self
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        channel.thresholds = thresholds;
        Ok(())
    }

    /// Sample every channel at `now` and fold the readings into their windows
    pub fn tick(&mut self, now: i64, rng: &mut dyn RandomSource) -> &[Channel] {
        let now = self.last_tick.map_or(now, |last| now.max(last));
        self.last_tick = Some(now);

        for channel in &mut self.channels {
            let value = self.generator.next_value(channel, now, rng);
            append_sample(channel, Sample::new(now, value));
        }

        tracing::trace!("Tick at {} over {} channels", now, self.channels.len());
        &self.channels
    }

    /// Time of the most recent tick
    pub fn last_tick(&self) -> Option<i64> {
        self.last_tick
    }

    /// Smallest creation index whose id is not registered
    pub fn next_index(&self) -> usize {
        let taken: HashSet<&str> = self.channels.iter().map(|c| c.id.as_str()).collect();
        (0..)
            .find(|&i| !taken.contains(Channel::id_for(i).as_str()))
            .unwrap_or(self.channels.len())
    }

    /// Get a channel by id
    pub fn get(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.id == id)
    }

    /// Returns true if `id` is registered
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns true if no channels are registered
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Iterate channels in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    /// Channel ids in insertion order
    pub fn ids(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.id.clone()).collect()
    }

    /// Current limit status of every channel
    pub fn statuses(&self) -> Vec<(String, LimitStatus)> {
        self.channels
            .iter()
            .map(|c| (c.id.clone(), check_limits(c)))
            .collect()
    }

    /// Copy the current state into an immutable snapshot
    pub fn snapshot(&self, generation: u64) -> RegistrySnapshot {
        RegistrySnapshot::new(generation, self.last_tick, self.channels.clone())
    }
}
