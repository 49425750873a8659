//! Linearly Weighted Moving Average (WMA).
//!
//! Weights run 1..=N from the oldest close in the window to the newest, so the
//! current bar carries weight N. WMA[i] = Σ close·weight / Σ weight.
//! Lookback: period - 1.

use super::{IndicatorError, MovingAverage};

#[derive(Debug, Clone)]
pub struct Wma {
    period: usize,
    name: String,
}

impl Wma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::ZeroWindow { name: "wma" });
        }
        Ok(Self {
            period,
            name: format!("wma_{period}"),
        })
    }

    /// Σ weight = N(N+1)/2.
    fn weight_sum(&self) -> f64 {
        (self.period * (self.period + 1)) as f64 / 2.0
    }
}

impl MovingAverage for Wma {
    fn name(&self) -> &str {
        &self.name
    }

    fn period(&self) -> usize {
        self.period
    }

    fn compute(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let n = closes.len();
        let mut result = vec![None; n];
        if n < self.period {
            return result;
        }

        let denominator = self.weight_sum();
        for (offset, window) in closes.windows(self.period).enumerate() {
            if window.iter().any(|c| !c.is_finite()) {
                continue;
            }
            let weighted: f64 = window
                .iter()
                .enumerate()
                .map(|(k, close)| close * (k + 1) as f64)
                .sum();
            result[offset + self.period - 1] = Some(weighted / denominator);
        }

        result
    }
}

/// Weighted moving average of `closes` over `period` bars.
pub fn wma(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    Ok(Wma::new(period)?.compute(closes))
}
