//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::{IndicatorError, MovingAverage};

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::ZeroWindow { name: "sma" });
        }
        Ok(Self {
            period,
            name: format!("sma_{period}"),
        })
    }
}

impl MovingAverage for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn period(&self) -> usize {
        self.period
    }

    fn compute(&self, closes: &[f64]) -> Vec<Option<f64>> {
        rolling_mean(closes, self.period)
    }
}

/// Simple moving average of `closes` over `period` bars.
pub fn sma(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    Ok(Sma::new(period)?.compute(closes))
}

fn rolling_mean(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut result = vec![None; n];
    if n < period {
        return result;
    }

    let mut sum: f64 = closes[..period].iter().sum();
    let mut tainted = closes[..period].iter().any(|c| !c.is_finite());
    if !tainted {
        result[period - 1] = Some(sum / period as f64);
    }

    for i in period..n {
        let leaving = closes[i - period];
        let entering = closes[i];

        if tainted || !leaving.is_finite() || !entering.is_finite() {
            // A non-finite close poisons the running sum; rescan the window.
            let window = &closes[(i + 1 - period)..=i];
            tainted = window.iter().any(|c| !c.is_finite());
            if tainted {
                continue;
            }
            sum = window.iter().sum();
        } else {
            sum = sum - leaving + entering;
        }

        result[i] = Some(sum / period as f64);
    }

    result
}
