//! Performance aggregation: compounding deposit, win/loss statistics.
//!
//! Consumes closed trades in chronological order. Every trade reinvests the
//! whole deposit: `D_i = D_{i-1} * (1 + r_i)` with `r_i = (exit - entry) / entry`.
//! A trade is a loss iff `r_i < 0`; a flat trade counts as a win.

use serde::{Deserialize, Serialize};

use crosslab_core::domain::ClosedTrade;

/// Summary statistics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub initial_deposit: f64,
    pub final_deposit: f64,
    /// `final_deposit / initial_deposit - 1`.
    pub return_pct: f64,
    pub closed_trade_count: usize,
    pub longest_loss_streak: usize,
    /// Average winning dollar result over average losing dollar magnitude.
    pub win_loss_ratio: f64,
    pub win_rate: f64,
    pub wins: usize,
    pub losses: usize,
    pub avg_win: f64,
    pub avg_loss: f64,
    /// Deposit after each closed trade.
    pub equity_after_trade: Vec<f64>,
}

impl Report {
    /// Aggregate a full closed-trade list.
    pub fn compute(initial_deposit: f64, trades: &[ClosedTrade]) -> Self {
        let mut agg = PerformanceAggregator::new(initial_deposit);
        for trade in trades {
            agg.push(trade);
        }
        agg.finish()
    }
}

/// Running state over the closed-trade sequence.
#[derive(Debug, Clone)]
pub struct PerformanceAggregator {
    initial_deposit: f64,
    deposit: f64,
    current_loss_streak: usize,
    longest_loss_streak: usize,
    wins: usize,
    win_sum: f64,
    losses: usize,
    loss_sum: f64,
    equity: Vec<f64>,
}

impl PerformanceAggregator {
    pub fn new(initial_deposit: f64) -> Self {
        Self {
            initial_deposit,
            deposit: initial_deposit,
            current_loss_streak: 0,
            longest_loss_streak: 0,
            wins: 0,
            win_sum: 0.0,
            losses: 0,
            loss_sum: 0.0,
            equity: Vec::new(),
        }
    }

    /// Fold in the next closed trade.
    pub fn push(&mut self, trade: &ClosedTrade) {
        let before = self.deposit;
        self.deposit = before * (1.0 + trade.return_pct());
        let result = self.deposit - before;

        if trade.is_loss() {
            self.losses += 1;
            self.loss_sum += result.abs();
            self.current_loss_streak += 1;
            self.longest_loss_streak = self.longest_loss_streak.max(self.current_loss_streak);
        } else {
            self.wins += 1;
            self.win_sum += result;
            self.current_loss_streak = 0;
        }
        self.equity.push(self.deposit);
    }

    pub fn finish(self) -> Report {
        let n = self.wins + self.losses;
        let avg_win = if self.wins > 0 {
            self.win_sum / self.wins as f64
        } else {
            0.0
        };
        let avg_loss = if self.losses > 0 {
            self.loss_sum / self.losses as f64
        } else {
            0.0
        };
        let win_loss_ratio = if self.wins > 0 && self.losses > 0 && avg_loss > 0.0 {
            avg_win / avg_loss
        } else {
            0.0
        };
        let win_rate = if n > 0 {
            self.wins as f64 / n as f64
        } else {
            0.0
        };
        let return_pct = if self.initial_deposit > 0.0 {
            self.deposit / self.initial_deposit - 1.0
        } else {
            0.0
        };

        Report {
            initial_deposit: self.initial_deposit,
            final_deposit: self.deposit,
            return_pct,
            closed_trade_count: n,
            longest_loss_streak: self.longest_loss_streak,
            win_loss_ratio,
            win_rate,
            wins: self.wins,
            losses: self.losses,
            avg_win,
            avg_loss,
            equity_after_trade: self.equity,
        }
    }
}
