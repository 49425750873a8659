//! Serializable backtest configuration.
//!
//! One TOML file reproduces one run:
//!
//! ```toml
//! [backtest]
//! symbol = "SPY"
//! initial_deposit = 7000.0
//!
//! [indicators]
//! fast_sma = 10
//! slow_wma = 110
//!
//! [simulation]
//! stop_loss_factor = 0.99
//!
//! [simulation.entry]
//! type = "limit"
//! offset_bps = 0.0
//! timeout_bars = 3
//! ```
//!
//! Every section and field falls back to its default when omitted.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crosslab_core::engine::{SimConfigError, SimulationConfig};
use crosslab_core::indicators::MaPeriods;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid simulation settings: {0}")]
    Simulation(#[from] SimConfigError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub indicators: MaPeriods,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub symbol: String,
    /// Starting deposit, compounded trade by trade.
    pub initial_deposit: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            initial_deposit: 7000.0,
        }
    }
}

impl BacktestConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("backtest.symbol must not be empty".into()));
        }
        let deposit = self.backtest.initial_deposit;
        if !deposit.is_finite() || deposit <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "backtest.initial_deposit must be > 0, got {deposit}"
            )));
        }

        let p = &self.indicators;
        for (name, period) in [
            ("fast_sma", p.fast_sma),
            ("slow_wma", p.slow_wma),
            ("trend_wma", p.trend_wma),
            ("trend_sma", p.trend_sma),
        ] {
            if period == 0 {
                return Err(ConfigError::Invalid(format!(
                    "indicators.{name} must be >= 1"
                )));
            }
        }

        self.simulation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosslab_core::engine::{CrossoverPrecision, EntryMode, TradingSession};

    #[test]
    fn defaults_round_trip() {
        let config = BacktestConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(BacktestConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn customised_config_round_trips() {
        let mut config = BacktestConfig::default();
        config.backtest.symbol = "QQQ".into();
        config.simulation.session = Some(TradingSession::default());
        config.simulation.crossover_precision = CrossoverPrecision::Exact;
        config.simulation.entry = EntryMode::Limit {
            offset_bps: 5.0,
            timeout_bars: 3,
        };
        let text = config.to_toml().unwrap();
        assert_eq!(BacktestConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(
            BacktestConfig::from_toml("").unwrap(),
            BacktestConfig::default()
        );
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let config = BacktestConfig::from_toml(
            r#"
            [backtest]
            symbol = "AAPL"

            [indicators]
            fast_sma = 5

            [simulation]
            stop_loss_factor = 0.98
            crossover_precision = { decimals = 2 }

            [simulation.session]
            start = "10:00:00"
            end = "15:30:00"

            [simulation.entry]
            type = "limit"
            offset_bps = 2.5
            timeout_bars = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.backtest.symbol, "AAPL");
        assert_eq!(config.backtest.initial_deposit, 7000.0);
        assert_eq!(config.indicators.fast_sma, 5);
        assert_eq!(config.indicators.slow_wma, 110);
        assert_eq!(config.simulation.stop_loss_factor, 0.98);
        assert_eq!(
            config.simulation.crossover_precision,
            CrossoverPrecision::Decimals(2)
        );
        assert_eq!(
            config.simulation.entry,
            EntryMode::Limit {
                offset_bps: 2.5,
                timeout_bars: 4
            }
        );
        assert!(config.simulation.session.is_some());
    }

    #[test]
    fn invalid_stop_factor_rejected() {
        let err = BacktestConfig::from_toml("[simulation]\nstop_loss_factor = 1.5\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Simulation(SimConfigError::StopLossFactor(_))
        ));
    }

    #[test]
    fn zero_window_rejected() {
        let err = BacktestConfig::from_toml("[indicators]\nslow_wma = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn non_positive_deposit_rejected() {
        let err = BacktestConfig::from_toml("[backtest]\ninitial_deposit = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unparseable_toml_is_parse_error() {
        assert!(matches!(
            BacktestConfig::from_toml("[backtest\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, "[backtest]\nsymbol = \"IWM\"\n").unwrap();
        assert_eq!(BacktestConfig::from_file(&path).unwrap().backtest.symbol, "IWM");
        assert!(matches!(
            BacktestConfig::from_file(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
