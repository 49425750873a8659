//! Bar providers and the bar-series contract.

pub mod csv_file;
pub mod provider;
pub mod synthetic;

pub use csv_file::{write_bars_csv, CsvProvider};
pub use provider::{validate_bars, BarProvider, DataError, InMemoryProvider};
pub use synthetic::SyntheticProvider;
