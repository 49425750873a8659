//! Backtest runner: wires together data loading, averages, simulator and metrics.
//!
//! Two entry points:
//! - `run_backtest()`: loads bars from a provider, then runs. Used by the CLI.
//! - `run_backtest_on_bars()`: takes pre-loaded bars. Used by tests and embedders.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crosslab_core::data::{BarProvider, DataError};
use crosslab_core::domain::{Bar, ClosedTrade, Trade};
use crosslab_core::engine::{PositionSimulator, SimEvent, SimulationError};
use crosslab_core::indicators::{augment, IndicatorError};

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{compute_dataset_hash, load_bars};
use crate::metrics::Report;

/// Errors from the runner. Any of them aborts the run with no partial report.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("indicator error: {0}")]
    Indicator(#[from] IndicatorError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub dataset_hash: String,
    pub bar_count: usize,
    /// Bars on which the simulator evaluated a transition.
    pub evaluated_bars: usize,
    pub config: BacktestConfig,
    pub report: Report,
    pub trades: Vec<ClosedTrade>,
    /// Still open at the last bar; excluded from `report`.
    pub open_trade: Option<Trade>,
    pub events: Vec<SimEvent>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run the configured symbol from `provider`.
pub fn run_backtest(
    config: &BacktestConfig,
    provider: &dyn BarProvider,
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let loaded = load_bars(provider, &config.backtest.symbol)?;
    run_backtest_on_bars(config, loaded.bars, &loaded.dataset_hash)
}

/// Run on bars already in memory, without I/O.
///
/// `bars` must already satisfy the series contract; see
/// [`crosslab_core::data::validate_bars`]. Pass an empty `dataset_hash` to have
/// it computed here.
pub fn run_backtest_on_bars(
    config: &BacktestConfig,
    bars: Vec<Bar>,
    dataset_hash: &str,
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let symbol = config.backtest.symbol.clone();
    crosslab_core::data::validate_bars(&symbol, &bars)?;

    let dataset_hash = if dataset_hash.is_empty() {
        compute_dataset_hash(&symbol, &bars)
    } else {
        dataset_hash.to_string()
    };
    let bar_count = bars.len();

    let augmented = augment(bars, &config.indicators)?;
    let outcome = PositionSimulator::new(config.simulation.clone())?.run(&augmented)?;

    let trades = outcome.ledger.closed_trades();
    let open_trade = outcome.ledger.open_trade().cloned();
    let report = Report::compute(config.backtest.initial_deposit, &trades);

    info!(
        symbol = %symbol,
        bars = bar_count,
        trades = report.closed_trade_count,
        final_deposit = report.final_deposit,
        return_pct = report.return_pct,
        open = open_trade.is_some(),
        "backtest complete"
    );

    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        symbol,
        dataset_hash,
        bar_count,
        evaluated_bars: outcome.evaluated_bars,
        config: config.clone(),
        report,
        trades,
        open_trade,
        events: outcome.events,
    })
}
