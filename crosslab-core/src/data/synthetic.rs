//! Synthetic minute bars for demos and benches.
//!
//! A seeded random walk: the seed is derived from the symbol with BLAKE3, so
//! the same symbol always yields the same series. Bars are clearly fake and
//! should never be mistaken for market data.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{BarProvider, DataError};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    start: NaiveDateTime,
    bar_count: usize,
    start_price: f64,
}

impl SyntheticProvider {
    pub fn new(start: NaiveDateTime, bar_count: usize, start_price: f64) -> Self {
        Self {
            start,
            bar_count,
            start_price,
        }
    }

    /// Generate the series for `symbol`.
    pub fn generate(&self, symbol: &str) -> Vec<Bar> {
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut bars = Vec::with_capacity(self.bar_count);
        let mut price = self.start_price;
        // Slowly drifting regime so the averages actually cross.
        let mut drift = 0.0_f64;

        for i in 0..self.bar_count {
            if i % 240 == 0 {
                drift = rng.gen_range(-0.0004..0.0004);
            }
            let step: f64 = drift + rng.gen_range(-0.002..0.002);
            let open = price;
            let close = (price * (1.0 + step)).max(0.01);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.001));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.001));
            let volume = rng.gen_range(100..10_000u32) as f64;

            bars.push(Bar {
                timestamp: self.start + Duration::minutes(i as i64),
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }
        bars
    }
}

impl Default for SyntheticProvider {
    /// 5000 minute bars from 2025-01-02 09:30, starting at 100.
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2025, 1, 2)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap_or_default();
        Self::new(start, 5_000, 100.0)
    }
}

impl BarProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn get_bars(&self, symbol: &str) -> Result<Vec<Bar>, DataError> {
        let bars = self.generate(symbol);
        if bars.is_empty() {
            return Err(DataError::Empty {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }
}
