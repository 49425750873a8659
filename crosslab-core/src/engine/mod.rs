//! Backtesting engine: one pass over augmented bars.
//!
//! The simulator consumes bars with their moving averages already attached
//! and walks them once, oldest to newest:
//!
//! 1. Skip bars whose required averages are still warming up
//! 2. Flat: guards (flat bar, session, trend), then the cross-up check
//! 3. Long: cross-down and stop-loss checks, mutually exclusive
//! 4. Every transition lands in the trade ledger

pub mod config;
pub mod ledger;
pub mod simulator;

pub use config::{CrossoverPrecision, EntryMode, SimConfigError, SimulationConfig, TradingSession};
pub use ledger::{LedgerError, TradeLedger};
pub use simulator::{simulate, PositionSimulator, SimEvent, SimulationError, SimulationOutcome};
