//! Threshold evaluation
//!
//! Limits are checked against a channel's current value only. The high limit
//! is checked first, so a misconfigured pair (`high < low`) that both match
//! reports [`LimitStatus::High`].

use crate::types::{Channel, LimitBadge, LimitStatus, ThresholdConfig};

/// Classify `value` against `thresholds`
pub fn evaluate(thresholds: &ThresholdConfig, value: f64) -> LimitStatus {
    if !thresholds.enabled {
        return LimitStatus::None;
    }

    if thresholds.high.is_some_and(|high| value > high) {
        return LimitStatus::High;
    }

    if thresholds.low.is_some_and(|low| value < low) {
        return LimitStatus::Low;
    }

    LimitStatus::None
}

/// Classify a channel's current value against its thresholds
pub fn check_limits(channel: &Channel) -> LimitStatus {
    evaluate(&channel.thresholds, channel.current_value)
}

/// Badge for a channel in a selector list
pub fn limit_badge(channel: &Channel) -> LimitBadge {
    match check_limits(channel) {
        LimitStatus::High => LimitBadge::High,
        LimitStatus::Low => LimitBadge::Low,
        LimitStatus::None if channel.thresholds.enabled => LimitBadge::Armed,
        LimitStatus::None => LimitBadge::Unlimited,
    }
}
