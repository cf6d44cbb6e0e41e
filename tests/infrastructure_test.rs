//! Test to verify test infrastructure works correctly

mod common;

use common::builders::ChannelBuilder;
use tempvis_rs::engine::RandomSource;
use tempvis_rs::ThresholdConfig;

#[test]
fn test_infrastructure_setup() {
    let channel = ChannelBuilder::new("channel_0")
        .thresholds(ThresholdConfig::enabled(Some(30.0), None))
        .sample(common::T0, 21.0)
        .build();

    assert_eq!(channel.id, "channel_0");
    assert!(channel.thresholds.enabled);
    assert_eq!(channel.history.len(), 1);
}

#[test]
fn test_random_helpers() {
    assert_eq!(common::random_helpers::quiet_source().symmetric(5.0), 0.0);
    assert!(common::random_helpers::loud_source().next_unit() < 1.0);
    let mut a = common::random_helpers::seeded_source();
    let mut b = common::random_helpers::seeded_source();
    assert_eq!(a.next_unit(), b.next_unit());
}

#[test]
fn test_float_comparison() {
    common::assert_float_eq(1.0, 1.0000001, 0.001);
}

#[test]
#[should_panic]
fn test_float_comparison_fails() {
    common::assert_float_eq(1.0, 2.0, 0.001);
}
