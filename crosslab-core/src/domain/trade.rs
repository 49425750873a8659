//! Trade: one long round trip, open until an exit is attached.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// The fast average crossed below the slow average.
    CrossDown,
    /// The close fell through the stop price; filled at the stop.
    StopLoss,
}

/// Entry side of a trade, as recorded by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeEntry {
    pub index: usize,
    pub time: NaiveDateTime,
    pub price: f64,
}

/// Exit side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeExit {
    pub index: usize,
    pub time: NaiveDateTime,
    pub price: f64,
    pub reason: ExitReason,
}

/// A trade record. `exit == None` means the trade is still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit: Option<TradeExit>,
}

impl Trade {
    pub fn open(entry: TradeEntry) -> Self {
        Self {
            entry_index: entry.index,
            entry_time: entry.time,
            entry_price: entry.price,
            exit: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.exit.is_none()
    }

    /// Closed view of this trade, or `None` while it is still open.
    pub fn to_closed(&self) -> Option<ClosedTrade> {
        let exit = self.exit?;
        Some(ClosedTrade {
            entry_index: self.entry_index,
            entry_time: self.entry_time,
            entry_price: self.entry_price,
            exit_index: exit.index,
            exit_time: exit.time,
            exit_price: exit.price,
            exit_reason: exit.reason,
        })
    }
}

/// A fully closed round trip, flattened for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_index: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
}

impl ClosedTrade {
    /// Return on the trade as a fraction of the entry price.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        (self.exit_price - self.entry_price) / self.entry_price
    }

    /// Losses are strictly negative returns; a flat trade counts as a win.
    pub fn is_loss(&self) -> bool {
        self.return_pct() < 0.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index.saturating_sub(self.entry_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 3)
            .unwrap()
            .and_hms_opt(10, minute, 0)
            .unwrap()
    }

    fn sample_trade() -> Trade {
        let mut trade = Trade::open(TradeEntry {
            index: 4,
            time: at(4),
            price: 100.0,
        });
        trade.exit = Some(TradeExit {
            index: 9,
            time: at(9),
            price: 97.0,
            reason: ExitReason::StopLoss,
        });
        trade
    }

    #[test]
    fn open_trade_has_no_closed_view() {
        let trade = Trade::open(TradeEntry {
            index: 1,
            time: at(1),
            price: 10.0,
        });
        assert!(trade.is_open());
        assert!(trade.to_closed().is_none());
    }

    #[test]
    fn closed_view_carries_exit_fields() {
        let closed = sample_trade().to_closed().unwrap();
        assert_eq!(closed.exit_index, 9);
        assert_eq!(closed.exit_reason, ExitReason::StopLoss);
        assert_eq!(closed.bars_held(), 5);
        assert!((closed.return_pct() + 0.03).abs() < 1e-12);
        assert!(closed.is_loss());
    }

    #[test]
    fn breakeven_is_not_a_loss() {
        let mut closed = sample_trade().to_closed().unwrap();
        closed.exit_price = closed.entry_price;
        assert!(!closed.is_loss());
    }

    #[test]
    fn exit_reason_serializes_snake_case() {
        let json = serde_json::to_string(&ExitReason::CrossDown).unwrap();
        assert_eq!(json, "\"cross_down\"");
    }
}
