//! Trade ledger: append-only record of the run's trades.
//!
//! At most one trade is open at a time. Violations are returned as
//! [`LedgerError`]; the simulator treats any of them as fatal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ClosedTrade, Trade, TradeEntry, TradeExit};

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("trade opened at bar {open_index} is still open")]
    TradeAlreadyOpen { open_index: usize },
    #[error("no open trade to close")]
    NoOpenTrade,
    #[error("exit at bar {exit_index} is not after entry at bar {entry_index}")]
    ExitNotAfterEntry {
        entry_index: usize,
        exit_index: usize,
    },
    #[error("entry at bar {index} is not after the previous entry")]
    NonIncreasingEntry { index: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeLedger {
    trades: Vec<Trade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new trade. Fails if a trade is already open.
    pub fn open(&mut self, entry: TradeEntry) -> Result<&Trade, LedgerError> {
        if let Some(last) = self.trades.last() {
            if last.is_open() {
                return Err(LedgerError::TradeAlreadyOpen {
                    open_index: last.entry_index,
                });
            }
            if entry.time <= last.entry_time || entry.index <= last.entry_index {
                return Err(LedgerError::NonIncreasingEntry { index: entry.index });
            }
        }
        self.trades.push(Trade::open(entry));
        Ok(&self.trades[self.trades.len() - 1])
    }

    /// Close the currently open trade.
    pub fn close(&mut self, exit: TradeExit) -> Result<&Trade, LedgerError> {
        let trade = self
            .trades
            .last_mut()
            .filter(|t| t.is_open())
            .ok_or(LedgerError::NoOpenTrade)?;
        if exit.index <= trade.entry_index {
            return Err(LedgerError::ExitNotAfterEntry {
                entry_index: trade.entry_index,
                exit_index: exit.index,
            });
        }
        trade.exit = Some(exit);
        Ok(trade)
    }

    /// Fully closed trades, in entry order.
    pub fn closed_trades(&self) -> Vec<ClosedTrade> {
        self.trades.iter().filter_map(Trade::to_closed).collect()
    }

    /// The open trade, if any.
    pub fn open_trade(&self) -> Option<&Trade> {
        self.trades.last().filter(|t| t.is_open())
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExitReason;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(index: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 3)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            + chrono::Duration::minutes(index as i64)
    }

    fn entry(index: usize, price: f64) -> TradeEntry {
        TradeEntry {
            index,
            time: at(index),
            price,
        }
    }

    fn exit(index: usize, price: f64) -> TradeExit {
        TradeExit {
            index,
            time: at(index),
            price,
            reason: ExitReason::CrossDown,
        }
    }

    #[test]
    fn open_then_close() {
        let mut ledger = TradeLedger::new();
        ledger.open(entry(2, 10.0)).unwrap();
        assert!(ledger.open_trade().is_some());
        assert!(ledger.closed_trades().is_empty());

        let closed = ledger.close(exit(5, 11.0)).unwrap();
        assert_eq!(closed.exit.unwrap().index, 5);
        assert!(ledger.open_trade().is_none());
        assert_eq!(ledger.closed_trades().len(), 1);
    }

    #[test]
    fn second_open_is_rejected() {
        let mut ledger = TradeLedger::new();
        ledger.open(entry(2, 10.0)).unwrap();
        assert_eq!(
            ledger.open(entry(3, 10.5)).unwrap_err(),
            LedgerError::TradeAlreadyOpen { open_index: 2 }
        );
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn close_without_open_is_rejected() {
        let mut ledger = TradeLedger::new();
        assert_eq!(ledger.close(exit(1, 1.0)).unwrap_err(), LedgerError::NoOpenTrade);

        ledger.open(entry(2, 10.0)).unwrap();
        ledger.close(exit(4, 9.0)).unwrap();
        assert_eq!(ledger.close(exit(6, 9.0)).unwrap_err(), LedgerError::NoOpenTrade);
    }

    #[test]
    fn exit_must_follow_entry() {
        let mut ledger = TradeLedger::new();
        ledger.open(entry(7, 10.0)).unwrap();
        assert_eq!(
            ledger.close(exit(7, 10.0)).unwrap_err(),
            LedgerError::ExitNotAfterEntry {
                entry_index: 7,
                exit_index: 7
            }
        );
        assert!(ledger.open_trade().is_some());
    }

    #[test]
    fn entries_must_increase() {
        let mut ledger = TradeLedger::new();
        ledger.open(entry(5, 10.0)).unwrap();
        ledger.close(exit(8, 10.0)).unwrap();
        assert_eq!(
            ledger.open(entry(4, 10.0)).unwrap_err(),
            LedgerError::NonIncreasingEntry { index: 4 }
        );
    }

    #[test]
    fn closed_trades_keep_entry_order_and_skip_open() {
        let mut ledger = TradeLedger::new();
        ledger.open(entry(1, 10.0)).unwrap();
        ledger.close(exit(3, 11.0)).unwrap();
        ledger.open(entry(5, 12.0)).unwrap();
        ledger.close(exit(6, 11.0)).unwrap();
        ledger.open(entry(9, 13.0)).unwrap();

        let closed = ledger.closed_trades();
        assert_eq!(closed.len(), 2);
        assert_eq!(closed[0].entry_index, 1);
        assert_eq!(closed[1].entry_index, 5);
        assert_eq!(ledger.open_trade().unwrap().entry_index, 9);
    }
}
