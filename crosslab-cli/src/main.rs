//! CrossLab CLI: run, synth, and config commands.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config over a CSV file or synthetic bars
//! - `synth`: write a synthetic minute-bar CSV for demos
//! - `default-config`: print the default TOML config

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crosslab_core::data::{write_bars_csv, BarProvider, CsvProvider, SyntheticProvider};
use crosslab_runner::export::{export_json, save_artifacts};
use crosslab_runner::{run_backtest, BacktestConfig, BacktestReport};

#[derive(Parser)]
#[command(
    name = "crosslab",
    about = "CrossLab CLI: moving-average crossover backtester"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest.
    Run {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// CSV bar file (symbol,datetime,open,high,low,close,volume).
        #[arg(long, conflicts_with = "synthetic")]
        data: Option<PathBuf>,

        /// Use synthetic bars instead of a data file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Override the symbol from the config.
        #[arg(long)]
        symbol: Option<String>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the full report as JSON instead of the summary.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Skip writing artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Write synthetic minute bars to a CSV file.
    Synth {
        /// Symbol; also seeds the random walk.
        #[arg(long, default_value = "SPY")]
        symbol: String,

        /// Number of bars.
        #[arg(long, default_value_t = 5_000)]
        bars: usize,

        /// First bar timestamp (YYYY-MM-DD HH:MM:SS).
        #[arg(long, default_value = "2025-01-02 09:30:00")]
        start: String,

        /// Opening price of the walk.
        #[arg(long, default_value_t = 100.0)]
        start_price: f64,

        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the default config as TOML.
    DefaultConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            data,
            synthetic,
            symbol,
            output_dir,
            json,
            no_save,
        } => run_cmd(config, data, synthetic, symbol, output_dir, json, no_save),
        Commands::Synth {
            symbol,
            bars,
            start,
            start_price,
            out,
        } => synth_cmd(&symbol, bars, &start, start_price, out),
        Commands::DefaultConfig => {
            print!("{}", BacktestConfig::default().to_toml()?);
            Ok(())
        }
    }
}

/// Logs go to stderr; stdout is reserved for results.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_cmd(
    config_path: Option<PathBuf>,
    data: Option<PathBuf>,
    synthetic: bool,
    symbol: Option<String>,
    output_dir: PathBuf,
    json: bool,
    no_save: bool,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => BacktestConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => BacktestConfig::default(),
    };
    if let Some(symbol) = symbol {
        config.backtest.symbol = symbol;
    }

    let provider: Box<dyn BarProvider> = match (data, synthetic) {
        (Some(path), _) => Box::new(CsvProvider::new(path)),
        (None, true) => Box::new(SyntheticProvider::default()),
        (None, false) => bail!("one of --data or --synthetic is required"),
    };

    let report = run_backtest(&config, provider.as_ref())?;

    if json {
        println!("{}", export_json(&report)?);
    } else {
        print_summary(&report);
    }

    if !no_save {
        let run_dir = save_artifacts(&report, &output_dir)?;
        info!(dir = %run_dir.display(), "artifacts saved");
    }
    Ok(())
}

fn synth_cmd(symbol: &str, bars: usize, start: &str, start_price: f64, out: PathBuf) -> Result<()> {
    let start = NaiveDateTime::parse_from_str(start, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("invalid --start '{start}'"))?;
    if !start_price.is_finite() || start_price <= 0.0 {
        bail!("--start-price must be > 0");
    }
    let series = SyntheticProvider::new(start, bars, start_price).generate(symbol);
    write_bars_csv(&out, symbol, &series)
        .with_context(|| format!("failed to write {}", out.display()))?;
    info!(symbol, bars = series.len(), path = %out.display(), "synthetic bars written");
    Ok(())
}

fn print_summary(result: &BacktestReport) {
    let r = &result.report;
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:          {}", result.symbol);
    println!(
        "Bars:            {} ({} evaluated)",
        result.bar_count, result.evaluated_bars
    );
    println!("Closed Trades:   {}", r.closed_trade_count);
    println!();
    println!("--- Performance ---");
    println!("Initial Deposit: {:.2}", r.initial_deposit);
    println!("Final Deposit:   {:.2}", r.final_deposit);
    println!("Return:          {:.2}%", r.return_pct * 100.0);
    println!("Win Rate:        {:.1}%", r.win_rate * 100.0);
    println!("Win/Loss Ratio:  {:.2}", r.win_loss_ratio);
    println!("Max Loss Streak: {}", r.longest_loss_streak);
    if let Some(open) = &result.open_trade {
        println!();
        println!(
            "Open position from bar {} at {:.4} (excluded from metrics)",
            open.entry_index, open.entry_price
        );
    }
}
