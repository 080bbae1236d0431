//! Indicator implementations.
//!
//! Indicators are pure sequential transforms over a close-price slice: one
//! left-to-right pass, output index-aligned with the input, no look-ahead.

pub mod ema;
pub mod macd;

pub use ema::{alpha, compute_ema, ema_step, EmaState};
pub use macd::{compute_macd, macd_with, MacdParams, MacdSeries};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
