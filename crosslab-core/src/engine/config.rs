//! Simulation parameters.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SimConfigError {
    #[error("stop_loss_factor must be in (0, 1), got {0}")]
    StopLossFactor(f64),
    #[error("entry_margin must be finite and >= 0, got {0}")]
    EntryMargin(f64),
    #[error("limit offset_bps must be finite and in [0, 10000), got {0}")]
    LimitOffset(f64),
    #[error("session start {start} must be before end {end}")]
    Session { start: NaiveTime, end: NaiveTime },
}

/// Precision applied to the averages before crossover comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverPrecision {
    /// Compare raw values.
    Exact,
    /// Round to this many decimal places first.
    Decimals(u32),
}

impl CrossoverPrecision {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            CrossoverPrecision::Exact => value,
            CrossoverPrecision::Decimals(d) => crate::round_to(value, *d),
        }
    }
}

impl Default for CrossoverPrecision {
    fn default() -> Self {
        CrossoverPrecision::Decimals(3)
    }
}

/// Regular trading hours; entries are only taken inside `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingSession {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TradingSession {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }
}

impl Default for TradingSession {
    /// US equities regular session, 09:30–16:00 exchange time.
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
        }
    }
}

/// How an entry signal turns into a position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryMode {
    /// Filled immediately at the signal bar's close.
    #[default]
    Market,
    /// Limit buy at `close * (1 - offset_bps / 10_000)`, cancelled if still
    /// unfilled more than `timeout_bars` bars after submission.
    Limit { offset_bps: f64, timeout_bars: usize },
}

/// Parameters of one simulation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fraction of the entry price below which the position is stopped out.
    pub stop_loss_factor: f64,
    /// Cross-up requires `fast - slow > entry_margin`.
    pub entry_margin: f64,
    pub crossover_precision: CrossoverPrecision,
    /// Ignore bars whose close equals their open (2 decimals) while flat.
    pub skip_flat_bars: bool,
    /// Require the trend pair to agree before entering.
    pub trend_filter: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<TradingSession>,
    pub entry: EntryMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            stop_loss_factor: 0.99,
            entry_margin: 0.0,
            crossover_precision: CrossoverPrecision::default(),
            skip_flat_bars: false,
            trend_filter: false,
            session: None,
            entry: EntryMode::Market,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimConfigError> {
        let factor = self.stop_loss_factor;
        if !(factor > 0.0 && factor < 1.0) {
            return Err(SimConfigError::StopLossFactor(factor));
        }
        if !self.entry_margin.is_finite() || self.entry_margin < 0.0 {
            return Err(SimConfigError::EntryMargin(self.entry_margin));
        }
        if let EntryMode::Limit { offset_bps, .. } = self.entry {
            if !offset_bps.is_finite() || !(0.0..10_000.0).contains(&offset_bps) {
                return Err(SimConfigError::LimitOffset(offset_bps));
            }
        }
        if let Some(session) = self.session {
            if session.start >= session.end {
                return Err(SimConfigError::Session {
                    start: session.start,
                    end: session.end,
                });
            }
        }
        Ok(())
    }
}
