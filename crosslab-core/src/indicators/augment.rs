//! Attach the four moving averages to every bar.

use serde::{Deserialize, Serialize};

use super::{IndicatorError, MovingAverage, Sma, Wma};
use crate::domain::Bar;

/// Window sizes for the signal pair and the trend pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaPeriods {
    /// Fast SMA of the signal pair.
    pub fast_sma: usize,
    /// Slow WMA of the signal pair.
    pub slow_wma: usize,
    /// WMA of the trend pair.
    pub trend_wma: usize,
    /// SMA of the trend pair.
    pub trend_sma: usize,
}

impl Default for MaPeriods {
    fn default() -> Self {
        Self {
            fast_sma: 10,
            slow_wma: 110,
            trend_wma: 400,
            trend_sma: 4000,
        }
    }
}

/// Indicator values at one bar; `None` until the window has filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaSnapshot {
    pub fast_sma: Option<f64>,
    pub slow_wma: Option<f64>,
    pub trend_wma: Option<f64>,
    pub trend_sma: Option<f64>,
}

impl MaSnapshot {
    /// The signal pair, if both are defined.
    pub fn signal_pair(&self) -> Option<(f64, f64)> {
        Some((self.fast_sma?, self.slow_wma?))
    }

    /// The trend pair as (trend WMA, trend SMA), if both are defined.
    pub fn trend_pair(&self) -> Option<(f64, f64)> {
        Some((self.trend_wma?, self.trend_sma?))
    }
}

/// A bar with its derived indicator fields attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentedBar {
    pub bar: Bar,
    pub ma: MaSnapshot,
}

/// Compute all four averages over the close series and attach them to the bars.
pub fn augment(bars: Vec<Bar>, periods: &MaPeriods) -> Result<Vec<AugmentedBar>, IndicatorError> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let fast_sma = Sma::new(periods.fast_sma)?.compute(&closes);
    let slow_wma = Wma::new(periods.slow_wma)?.compute(&closes);
    let trend_wma = Wma::new(periods.trend_wma)?.compute(&closes);
    let trend_sma = Sma::new(periods.trend_sma)?.compute(&closes);

    Ok(bars
        .into_iter()
        .enumerate()
        .map(|(i, bar)| AugmentedBar {
            bar,
            ma: MaSnapshot {
                fast_sma: fast_sma[i],
                slow_wma: slow_wma[i],
                trend_wma: trend_wma[i],
                trend_sma: trend_sma[i],
            },
        })
        .collect())
}
