//! Deterministic random sources

use tempvis_rs::engine::{EntropySource, SequenceSource};

/// Source that always yields the midpoint, so every offset is zero
pub fn quiet_source() -> SequenceSource {
    SequenceSource::midpoint()
}

/// Source that always yields the top of the range
pub fn loud_source() -> SequenceSource {
    SequenceSource::new(vec![0.999_999])
}

/// Reproducible pseudo-random source
pub fn seeded_source() -> EntropySource {
    EntropySource::seeded(42)
}
