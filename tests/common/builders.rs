//! Test data builders for creating test objects

use tempvis_rs::{Channel, Sample, ThresholdConfig};

/// Builder for creating test Channels
pub struct ChannelBuilder {
    id: String,
    baseline: f64,
    created_at: i64,
    samples: Vec<(i64, f64)>,
    thresholds: ThresholdConfig,
}

impl ChannelBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            baseline: 20.0,
            created_at: 0,
            samples: Vec::new(),
            thresholds: ThresholdConfig::disabled(),
        }
    }

    pub fn baseline(mut self, baseline: f64) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn created_at(mut self, time: i64) -> Self {
        self.created_at = time;
        self
    }

    pub fn sample(mut self, time: i64, value: f64) -> Self {
        self.samples.push((time, value));
        self
    }

    pub fn thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn build(self) -> Channel {
        let mut channel = Channel::new(self.id.clone(), self.id, self.baseline, self.created_at)
            .with_thresholds(self.thresholds);
        for (time, value) in self.samples {
            channel.history.push(Sample::new(time, value));
        }
        if let Some(last) = channel.history.last().cloned() {
            channel.current_value = last.value;
            channel.last_update_time = last.time;
        }
        channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_builder() {
        let channel = ChannelBuilder::new("probe")
            .baseline(30.0)
            .sample(100, 31.0)
            .sample(200, 32.5)
            .build();

        assert_eq!(channel.id, "probe");
        assert_eq!(channel.baseline, 30.0);
        assert_eq!(channel.history.len(), 2);
        assert_eq!(channel.current_value, 32.5);
        assert_eq!(channel.last_update_time, 200);
    }
}
