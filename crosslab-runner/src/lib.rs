//! CrossLab Runner: backtest orchestration, configuration, metrics, export.
//!
//! This crate builds on `crosslab-core` to provide:
//! - TOML run configuration with defaults and validation
//! - Data loading with contract checks and dataset fingerprinting
//! - Single-backtest runner producing a serializable report
//! - Compounding performance aggregation
//! - JSON / CSV / Markdown artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{BacktestConfig, BacktestSection, ConfigError};
pub use data_loader::{compute_dataset_hash, load_bars, LoadedBars};
pub use metrics::{PerformanceAggregator, Report};
pub use runner::{run_backtest, run_backtest_on_bars, BacktestReport, RunError, SCHEMA_VERSION};
