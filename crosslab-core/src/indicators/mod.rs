//! Moving-average calculator.
//!
//! Averages are pure functions of a close-price series: the output has the
//! same length as the input, and index `i` is `None` until the window has
//! `period` closes ending at `i`. They are computed once before the bar loop
//! and attached to each bar as an [`MaSnapshot`].

pub mod augment;
pub mod sma;
pub mod wma;

use thiserror::Error;

pub use augment::{augment, AugmentedBar, MaPeriods, MaSnapshot};
pub use sma::{sma, Sma};
pub use wma::{wma, Wma};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndicatorError {
    #[error("{name}: window size must be >= 1")]
    ZeroWindow { name: &'static str },
}

/// A rolling moving average over close prices.
///
/// # Look-ahead guard
/// No value at index t may depend on closes after t. Computing over a
/// truncated series must give the same prefix as computing over the full one.
pub trait MovingAverage: Send + Sync {
    /// Human-readable name (e.g., "sma_10", "wma_110").
    fn name(&self) -> &str;

    /// Window size N.
    fn period(&self) -> usize;

    /// Number of leading values that are undefined (warm-up).
    fn lookback(&self) -> usize {
        self.period().saturating_sub(1)
    }

    /// Compute the average for the whole series.
    fn compute(&self, closes: &[f64]) -> Vec<Option<f64>>;
}

/// Test helpers shared by the indicator modules.
#[cfg(test)]
pub(crate) fn assert_approx(actual: Option<f64>, expected: f64, epsilon: f64) {
    let actual = actual.expect("expected a defined value");
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub(crate) const DEFAULT_EPSILON: f64 = 1e-10;
