//! Channel construction with seeded history

use super::generator::{RandomSource, SampleGenerator};
use crate::config::{BackfillSettings, GeneratorSettings};
use crate::types::{Channel, Sample};

/// Unit label used for every simulated channel
pub const TEMPERATURE_UNIT: &str = "°C";

/// Builds new channels and backfills their history
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelFactory {
    generator: SampleGenerator,
    backfill: BackfillSettings,
}

impl ChannelFactory {
    /// Create a factory with custom settings
    pub fn new(generator: GeneratorSettings, backfill: BackfillSettings) -> Self {
        Self {
            generator: SampleGenerator::new(generator),
            backfill,
        }
    }

    /// Create the channel for `index` with history ending at `now`
    ///
    /// Backfilled values are clamped to be non-negative. The window keeps the
    /// newest samples when the backfill span exceeds its capacity.
    pub fn create(&self, index: usize, now: i64, rng: &mut dyn RandomSource) -> Channel {
        let baseline = self.generator.baseline(index, rng);

        let mut channel = Channel::new(Channel::id_for(index), format!("Channel {}", index), baseline, now)
            .with_description(format!("Temperature sensor channel {}", index))
            .with_color(Channel::color_for(index))
            .with_unit(TEMPERATURE_UNIT);

        for time in self.backfill.times(now) {
            let value = self.generator.value_at(baseline, time, rng).max(0.0);
            channel.history.push(Sample::new(time, value));
        }

        if let Some(last) = channel.history.last() {
            channel.current_value = last.value;
        }
        channel.last_update_time = now;

        tracing::debug!(
            "Created {} (baseline {:.2}, {} backfilled samples)",
            channel.id,
            baseline,
            channel.history.len()
        );

        channel
    }
}

/// Create the channel for `index` using the default settings
pub fn create_channel(index: usize, now: i64, rng: &mut dyn RandomSource) -> Channel {
    ChannelFactory::default().create(index, now, rng)
}
