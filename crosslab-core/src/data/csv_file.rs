//! CSV bar files.
//!
//! Columns: `symbol,datetime,open,high,low,close,volume`. The `symbol` column
//! is optional; without it every row belongs to the requested symbol. Rows are
//! sorted by timestamp and duplicate timestamps keep the last row read.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use csv::StringRecord;
use tracing::debug;

use super::provider::{BarProvider, DataError};
use crate::domain::Bar;

/// Accepted timestamp layouts, tried in order.
const DATETIME_FORMATS: [&str; 2] = ["%Y%m%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Layout used when writing bars back out.
const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const REQUIRED: [&str; 6] = ["datetime", "open", "high", "low", "close", "volume"];

#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BarProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn get_bars(&self, symbol: &str) -> Result<Vec<Bar>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)?;
        let columns = Columns::from_headers(reader.headers()?)?;

        let mut by_time: BTreeMap<NaiveDateTime, Bar> = BTreeMap::new();
        let mut seen_symbol = columns.symbol.is_none();
        let mut rows = 0usize;

        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let row = i + 2; // 1-based, after the header
            rows += 1;
            if let Some(col) = columns.symbol {
                if record.get(col).map(str::trim) != Some(symbol) {
                    continue;
                }
                seen_symbol = true;
            }
            let bar = columns.parse(&record, row)?;
            by_time.insert(bar.timestamp, bar);
        }

        if !seen_symbol && rows > 0 {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if by_time.is_empty() {
            return Err(DataError::Empty {
                symbol: symbol.to_string(),
            });
        }

        debug!(
            path = %self.path.display(),
            symbol,
            rows,
            bars = by_time.len(),
            "loaded CSV bars"
        );
        Ok(by_time.into_values().collect())
    }
}

/// Column positions resolved from the header row.
struct Columns {
    symbol: Option<usize>,
    fields: [usize; 6],
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, DataError> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let mut fields = [0usize; 6];
        for (slot, name) in fields.iter_mut().zip(REQUIRED) {
            *slot = position(name).ok_or_else(|| DataError::Parse {
                row: 1,
                message: format!("missing column '{name}'"),
            })?;
        }
        Ok(Self {
            symbol: position("symbol"),
            fields,
        })
    }

    fn parse(&self, record: &StringRecord, row: usize) -> Result<Bar, DataError> {
        let field = |k: usize| record.get(self.fields[k]).unwrap_or("");
        let number = |k: usize| {
            field(k).parse::<f64>().map_err(|e| DataError::Parse {
                row,
                message: format!("{}: {e}", REQUIRED[k]),
            })
        };

        Ok(Bar {
            timestamp: parse_datetime(field(0)).ok_or_else(|| DataError::Parse {
                row,
                message: format!("unrecognised datetime '{}'", field(0)),
            })?,
            open: number(1)?,
            high: number(2)?,
            low: number(3)?,
            close: number(4)?,
            volume: number(5)?,
        })
    }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Write bars in the layout `CsvProvider` reads.
pub fn write_bars_csv(path: &Path, symbol: &str, bars: &[Bar]) -> Result<(), DataError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["symbol", "datetime", "open", "high", "low", "close", "volume"])?;
    for bar in bars {
        writer.write_record([
            symbol.to_string(),
            bar.timestamp.format(WRITE_FORMAT).to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
