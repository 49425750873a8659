//! Bar loading for the runner.
//!
//! Pulls one symbol from a provider, checks the series contract, and
//! fingerprints the data so a report can be tied to the exact bars it ran on.

use tracing::info;

use crosslab_core::data::{validate_bars, BarProvider, DataError};
use crosslab_core::domain::Bar;

/// Bars for one symbol plus their provenance.
#[derive(Debug, Clone)]
pub struct LoadedBars {
    pub symbol: String,
    pub bars: Vec<Bar>,
    /// BLAKE3 over symbol, timestamps and OHLCV values.
    pub dataset_hash: String,
    pub source: String,
}

/// Load and validate `symbol` from `provider`.
pub fn load_bars(provider: &dyn BarProvider, symbol: &str) -> Result<LoadedBars, DataError> {
    let bars = provider.get_bars(symbol)?;
    validate_bars(symbol, &bars)?;
    let dataset_hash = compute_dataset_hash(symbol, &bars);

    info!(
        symbol,
        provider = provider.name(),
        bars = bars.len(),
        first = %bars[0].timestamp,
        last = %bars[bars.len() - 1].timestamp,
        "bars loaded"
    );

    Ok(LoadedBars {
        symbol: symbol.to_string(),
        bars,
        dataset_hash,
        source: provider.name().to_string(),
    })
}

/// Compute a deterministic BLAKE3 hash over all bar data.
pub fn compute_dataset_hash(symbol: &str, bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    for bar in bars {
        hasher.update(bar.timestamp.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
