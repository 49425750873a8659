//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for backtest reports:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: trade tape and per-trade deposit curve
//! - **Markdown**: human-readable single-run summary
//!
//! Persisted reports carry a `schema_version` field. Newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use crosslab_core::domain::{ClosedTrade, ExitReason};

use crate::runner::{BacktestReport, SCHEMA_VERSION};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestReport` to pretty JSON.
pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a `BacktestReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export closed trades as CSV.
///
/// Columns: entry_index, entry_time, entry_price, exit_index, exit_time,
/// exit_price, exit_reason, return_pct, bars_held
pub fn export_trades_csv(trades: &[ClosedTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "entry_index",
        "entry_time",
        "entry_price",
        "exit_index",
        "exit_time",
        "exit_price",
        "exit_reason",
        "return_pct",
        "bars_held",
    ])?;

    for t in trades {
        let reason = match t.exit_reason {
            ExitReason::CrossDown => "cross_down",
            ExitReason::StopLoss => "stop_loss",
        };
        wtr.write_record([
            t.entry_index.to_string(),
            t.entry_time.format(TIME_FORMAT).to_string(),
            format!("{:.6}", t.entry_price),
            t.exit_index.to_string(),
            t.exit_time.format(TIME_FORMAT).to_string(),
            format!("{:.6}", t.exit_price),
            reason.to_string(),
            format!("{:.6}", t.return_pct()),
            t.bars_held().to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the deposit after each trade, starting with the initial deposit.
pub fn export_equity_csv(initial_deposit: f64, equity: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["trade", "deposit"])?;
    wtr.write_record(["0".to_string(), format!("{:.2}", initial_deposit)])?;
    for (i, deposit) in equity.iter().enumerate() {
        wtr.write_record([(i + 1).to_string(), format!("{:.2}", deposit)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates a directory named `{symbol}_{timestamp}/` under `output_dir`
/// containing:
/// - `report.json`: the full `BacktestReport`
/// - `trades.csv`: closed-trade tape
/// - `equity.csv`: deposit after each trade
/// - `report.md`: Markdown summary
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        report.symbol,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&report.trades)?)?;
    std::fs::write(
        run_dir.join("equity.csv"),
        export_equity_csv(report.report.initial_deposit, &report.report.equity_after_trade)?,
    )?;
    std::fs::write(run_dir.join("report.md"), generate_report(report))?;

    Ok(run_dir)
}

/// Load a `BacktestReport` from an artifact directory's report.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for a single backtest run.
pub fn generate_report(report: &BacktestReport) -> String {
    let r = &report.report;
    let mut md = String::with_capacity(1024);

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", report.symbol));
    md.push_str(&format!(
        "| Bars | {} ({} evaluated) |\n",
        report.bar_count, report.evaluated_bars
    ));
    md.push_str(&format!("| Dataset Hash | {} |\n", report.dataset_hash));
    let p = &report.config.indicators;
    md.push_str(&format!(
        "| Averages | SMA {} / WMA {} (trend WMA {} / SMA {}) |\n",
        p.fast_sma, p.slow_wma, p.trend_wma, p.trend_sma
    ));
    md.push_str(&format!(
        "| Stop Factor | {} |\n",
        report.config.simulation.stop_loss_factor
    ));
    md.push('\n');

    md.push_str("## Performance\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Initial Deposit | {:.2} |\n", r.initial_deposit));
    md.push_str(&format!("| Final Deposit | {:.2} |\n", r.final_deposit));
    md.push_str(&format!("| Return | {:.2}% |\n", r.return_pct * 100.0));
    md.push_str(&format!("| Closed Trades | {} |\n", r.closed_trade_count));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", r.win_rate * 100.0));
    md.push_str(&format!("| Win/Loss Ratio | {:.2} |\n", r.win_loss_ratio));
    md.push_str(&format!(
        "| Longest Loss Streak | {} |\n",
        r.longest_loss_streak
    ));
    md.push('\n');

    if let Some(open) = &report.open_trade {
        md.push_str(&format!(
            "Open position since bar {} at {:.4} (not included above).\n",
            open.entry_index, open.entry_price
        ));
    }

    md
}
