//! Position simulator: single pass over augmented bars, Flat/Long state machine.
//!
//! Per bar `i` (starting at 1), with `prev = bars[i-1]` and `cur = bars[i]`:
//!
//! - Skip the bar entirely if any required average is undefined at `i-1` or `i`.
//! - **Flat**: resolve a pending limit order if there is one; otherwise apply the
//!   flat-bar, session and trend guards and look for a cross-up
//!   (`fast_prev < slow_prev && fast - slow > margin`).
//! - **Long**: evaluate cross-down (`fast_prev >= slow_prev && fast < slow`) and
//!   the stop (`close < entry * factor`). Exactly one of the two must hold for
//!   an exit; when both hold on the same bar the position is kept.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::config::{EntryMode, SimConfigError, SimulationConfig};
use super::ledger::{LedgerError, TradeLedger};
use crate::domain::{ExitReason, PositionState, TradeEntry, TradeExit};
use crate::indicators::AugmentedBar;

/// Precision used by the flat-bar guard.
const FLAT_BAR_DECIMALS: u32 = 2;

#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("invalid simulation config: {0}")]
    Config(#[from] SimConfigError),
    #[error("ledger invariant violated at bar {index}: {source}")]
    Invariant {
        index: usize,
        #[source]
        source: LedgerError,
    },
}

/// Something the simulator did at a given bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    Entry {
        index: usize,
        time: NaiveDateTime,
        price: f64,
    },
    Exit {
        index: usize,
        time: NaiveDateTime,
        price: f64,
        reason: ExitReason,
    },
    OrderSubmitted {
        index: usize,
        time: NaiveDateTime,
        limit_price: f64,
    },
    OrderCancelled {
        index: usize,
        time: NaiveDateTime,
        submitted_index: usize,
    },
}

/// Everything a simulation pass produces.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub events: Vec<SimEvent>,
    pub ledger: TradeLedger,
    pub final_state: PositionState,
    /// Bars on which a transition was evaluated (warm-up excluded).
    pub evaluated_bars: usize,
}

#[derive(Debug, Clone, Copy)]
struct PendingOrder {
    submitted_index: usize,
    limit_price: f64,
}

/// Averages at t-1 and t after precision is applied.
#[derive(Debug, Clone, Copy)]
struct Crossing {
    fast_prev: f64,
    slow_prev: f64,
    fast: f64,
    slow: f64,
}

impl Crossing {
    fn is_up(&self, margin: f64) -> bool {
        self.fast_prev < self.slow_prev && self.fast - self.slow > margin
    }

    fn is_down(&self) -> bool {
        self.fast_prev >= self.slow_prev && self.fast < self.slow
    }
}

/// Walks a bar series once and records trades in its own ledger.
#[derive(Debug)]
pub struct PositionSimulator {
    config: SimulationConfig,
    state: PositionState,
    entry_price: Option<f64>,
    pending: Option<PendingOrder>,
    ledger: TradeLedger,
    events: Vec<SimEvent>,
    evaluated_bars: usize,
}

impl PositionSimulator {
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self {
            config,
            state: PositionState::Flat,
            entry_price: None,
            pending: None,
            ledger: TradeLedger::new(),
            events: Vec::new(),
            evaluated_bars: 0,
        })
    }

    /// Run the full pass. A ledger invariant violation halts the run.
    pub fn run(mut self, bars: &[AugmentedBar]) -> Result<SimulationOutcome, SimulationError> {
        for i in 1..bars.len() {
            let Some(crossing) = self.crossing(bars, i) else {
                continue;
            };
            self.evaluated_bars += 1;

            match self.state {
                PositionState::Flat => self.on_flat(bars, i, crossing)?,
                PositionState::Long => self.on_long(bars, i, crossing)?,
            }
        }

        info!(
            bars = bars.len(),
            evaluated = self.evaluated_bars,
            trades = self.ledger.len(),
            final_state = ?self.state,
            "simulation finished"
        );

        Ok(SimulationOutcome {
            events: self.events,
            ledger: self.ledger,
            final_state: self.state,
            evaluated_bars: self.evaluated_bars,
        })
    }

    /// Signal-pair values at i-1 and i, or `None` if the bar must be skipped.
    fn crossing(&self, bars: &[AugmentedBar], i: usize) -> Option<Crossing> {
        let prev = &bars[i - 1].ma;
        let cur = &bars[i].ma;
        let (fast_prev, slow_prev) = prev.signal_pair()?;
        let (fast, slow) = cur.signal_pair()?;
        if self.config.trend_filter {
            prev.trend_pair()?;
            cur.trend_pair()?;
        }

        let p = self.config.crossover_precision;
        Some(Crossing {
            fast_prev: p.apply(fast_prev),
            slow_prev: p.apply(slow_prev),
            fast: p.apply(fast),
            slow: p.apply(slow),
        })
    }

    fn on_flat(
        &mut self,
        bars: &[AugmentedBar],
        i: usize,
        crossing: Crossing,
    ) -> Result<(), SimulationError> {
        if let Some(order) = self.pending {
            return self.on_pending(bars, i, order);
        }

        let bar = &bars[i].bar;
        if self.config.skip_flat_bars && bar.is_flat(FLAT_BAR_DECIMALS) {
            return Ok(());
        }
        if let Some(session) = self.config.session {
            if !session.contains(bar.timestamp.time()) {
                return Ok(());
            }
        }
        if self.config.trend_filter && !self.trend_agrees(bars, i) {
            return Ok(());
        }
        if !crossing.is_up(self.config.entry_margin) {
            return Ok(());
        }

        match self.config.entry {
            EntryMode::Market => self.enter(i, bar.timestamp, bar.close),
            EntryMode::Limit { offset_bps, .. } => {
                let limit_price = bar.close * (1.0 - offset_bps / 10_000.0);
                debug!(index = i, time = %bar.timestamp, limit_price, "limit entry submitted");
                self.pending = Some(PendingOrder {
                    submitted_index: i,
                    limit_price,
                });
                self.events.push(SimEvent::OrderSubmitted {
                    index: i,
                    time: bar.timestamp,
                    limit_price,
                });
                Ok(())
            }
        }
    }

    /// Cancel the order once it outlives its timeout, otherwise try to fill it.
    fn on_pending(
        &mut self,
        bars: &[AugmentedBar],
        i: usize,
        order: PendingOrder,
    ) -> Result<(), SimulationError> {
        let bar = &bars[i].bar;
        let timeout = match self.config.entry {
            EntryMode::Limit { timeout_bars, .. } => timeout_bars,
            EntryMode::Market => 0,
        };

        if i - order.submitted_index > timeout {
            debug!(
                index = i,
                time = %bar.timestamp,
                submitted = order.submitted_index,
                "limit entry cancelled"
            );
            self.pending = None;
            self.events.push(SimEvent::OrderCancelled {
                index: i,
                time: bar.timestamp,
                submitted_index: order.submitted_index,
            });
            return Ok(());
        }

        if bar.low <= order.limit_price {
            self.pending = None;
            debug!(
                index = i,
                limit_price = order.limit_price,
                open = bar.open,
                "limit entry filled"
            );
            // Trade and stop reference use the limit price, even on a gap below it.
            return self.enter(i, bar.timestamp, order.limit_price);
        }
        Ok(())
    }

    fn on_long(
        &mut self,
        bars: &[AugmentedBar],
        i: usize,
        crossing: Crossing,
    ) -> Result<(), SimulationError> {
        let Some(entry_price) = self.entry_price else {
            return Ok(());
        };
        let bar = &bars[i].bar;
        let stop_price = entry_price * self.config.stop_loss_factor;

        let cross_down = crossing.is_down();
        let stopped = bar.close < stop_price;

        match (cross_down, stopped) {
            (true, false) => self.exit(i, bar.timestamp, bar.close, ExitReason::CrossDown),
            (false, true) => self.exit(i, bar.timestamp, stop_price, ExitReason::StopLoss),
            (true, true) => {
                debug!(index = i, time = %bar.timestamp, "cross-down and stop on same bar, holding");
                Ok(())
            }
            (false, false) => Ok(()),
        }
    }

    fn trend_agrees(&self, bars: &[AugmentedBar], i: usize) -> bool {
        let p = self.config.crossover_precision;
        let (Some((wma_prev, sma_prev)), Some((wma, sma))) =
            (bars[i - 1].ma.trend_pair(), bars[i].ma.trend_pair())
        else {
            return false;
        };
        let (wma_prev, sma_prev, wma, sma) =
            (p.apply(wma_prev), p.apply(sma_prev), p.apply(wma), p.apply(sma));
        wma > sma && wma > wma_prev && sma > sma_prev
    }

    fn enter(&mut self, i: usize, time: NaiveDateTime, price: f64) -> Result<(), SimulationError> {
        self.ledger
            .open(TradeEntry { index: i, time, price })
            .map_err(|source| SimulationError::Invariant { index: i, source })?;
        debug!(index = i, %time, price, "entry");
        self.state = PositionState::Long;
        self.entry_price = Some(price);
        self.events.push(SimEvent::Entry { index: i, time, price });
        Ok(())
    }

    fn exit(
        &mut self,
        i: usize,
        time: NaiveDateTime,
        price: f64,
        reason: ExitReason,
    ) -> Result<(), SimulationError> {
        self.ledger
            .close(TradeExit {
                index: i,
                time,
                price,
                reason,
            })
            .map_err(|source| SimulationError::Invariant { index: i, source })?;
        debug!(index = i, %time, price, ?reason, "exit");
        self.state = PositionState::Flat;
        self.entry_price = None;
        self.events.push(SimEvent::Exit {
            index: i,
            time,
            price,
            reason,
        });
        Ok(())
    }
}

/// Convenience wrapper: validate the config and run one pass.
pub fn simulate(
    bars: &[AugmentedBar],
    config: SimulationConfig,
) -> Result<SimulationOutcome, SimulationError> {
    PositionSimulator::new(config)?.run(bars)
}
