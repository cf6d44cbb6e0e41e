//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod random_helpers;

use std::time::Duration;

/// A fixed wall-clock origin for deterministic tests
pub const T0: i64 = 1_700_000_000_000;

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_millis(500)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
