//! Bar provider trait and structured error types.
//!
//! The BarProvider trait abstracts over bar sources (CSV file, in-memory map,
//! synthetic walk) so the runner can swap implementations and mock for tests.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::warn;

use crate::domain::Bar;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no bars for symbol '{symbol}'")]
    Empty { symbol: String },

    #[error("timestamps not strictly ascending at bar {index} ({time})")]
    NotAscending { index: usize, time: NaiveDateTime },
}

/// Source of bars for one symbol, oldest first.
pub trait BarProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// All bars for `symbol`, ascending by timestamp with no duplicates.
    fn get_bars(&self, symbol: &str) -> Result<Vec<Bar>, DataError>;
}

/// Symbol → bars map. Used by tests and when embedding the engine.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    bars: HashMap<String, Vec<Bar>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.insert(symbol, bars);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<Bar>) {
        self.bars.insert(symbol.into(), bars);
    }
}

impl BarProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn get_bars(&self, symbol: &str) -> Result<Vec<Bar>, DataError> {
        self.bars
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }
}

/// Check the series contract: non-empty and strictly ascending timestamps.
///
/// Bars that fail the OHLC sanity check are logged but kept; the simulator
/// only reads closes, opens and lows.
pub fn validate_bars(symbol: &str, bars: &[Bar]) -> Result<(), DataError> {
    if bars.is_empty() {
        return Err(DataError::Empty {
            symbol: symbol.to_string(),
        });
    }

    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(DataError::NotAscending {
                index: i + 1,
                time: pair[1].timestamp,
            });
        }
    }

    let insane = bars.iter().filter(|b| !b.is_sane()).count();
    if insane > 0 {
        warn!(symbol, insane, total = bars.len(), "bars failed OHLC sanity check");
    }
    Ok(())
}
