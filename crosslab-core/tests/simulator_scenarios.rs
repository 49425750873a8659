//! Scenario tests for the position simulator.
//!
//! Every scenario uses hand-picked averages so the expected trades can be
//! read straight off the table.

use chrono::{NaiveDate, NaiveDateTime};
use crosslab_core::domain::{Bar, ExitReason, PositionState};
use crosslab_core::engine::{
    simulate, CrossoverPrecision, SimEvent, SimulationConfig, SimulationOutcome, TradingSession,
};
use crosslab_core::indicators::{augment, AugmentedBar, MaPeriods, MaSnapshot};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 2, 3)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn bar_at(timestamp: NaiveDateTime, close: f64) -> Bar {
    Bar {
        timestamp,
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume: 1_000.0,
    }
}

/// One bar per minute with the signal pair set explicitly; open equals close.
fn scenario(closes: &[f64], short: &[f64], long: &[f64]) -> Vec<AugmentedBar> {
    assert_eq!(closes.len(), short.len());
    assert_eq!(closes.len(), long.len());
    closes
        .iter()
        .zip(short.iter().zip(long))
        .enumerate()
        .map(|(i, (&close, (&fast, &slow)))| AugmentedBar {
            bar: bar_at(start() + chrono::Duration::minutes(i as i64), close),
            ma: MaSnapshot {
                fast_sma: Some(fast),
                slow_wma: Some(slow),
                trend_wma: None,
                trend_sma: None,
            },
        })
        .collect()
}

fn run(bars: &[AugmentedBar], config: SimulationConfig) -> SimulationOutcome {
    simulate(bars, config).unwrap()
}

fn close_enough(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

// ── Moving averages ─────────────────────────────────────────────────

#[test]
fn averages_match_hand_computation() {
    let closes = [10.0, 11.0, 12.0, 13.0, 15.0];
    let bars: Vec<Bar> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| bar_at(start() + chrono::Duration::minutes(i as i64), c))
        .collect();
    let periods = MaPeriods {
        fast_sma: 3,
        slow_wma: 3,
        trend_wma: 2,
        trend_sma: 5,
    };
    let out = augment(bars, &periods).unwrap();

    assert!(out[1].ma.fast_sma.is_none());
    // SMA(3): (10+11+12)/3, (11+12+13)/3, (12+13+15)/3
    assert!(close_enough(out[2].ma.fast_sma.unwrap(), 11.0));
    assert!(close_enough(out[3].ma.fast_sma.unwrap(), 12.0));
    assert!(close_enough(out[4].ma.fast_sma.unwrap(), 40.0 / 3.0));
    // WMA(3), weights 1,2,3 on oldest..newest: (10+22+36)/6, (12+26+45)/6
    assert!(close_enough(out[2].ma.slow_wma.unwrap(), 68.0 / 6.0));
    assert!(close_enough(out[4].ma.slow_wma.unwrap(), 83.0 / 6.0));
    // SMA(5) only at the last bar.
    assert!(out[3].ma.trend_sma.is_none());
    assert!(close_enough(out[4].ma.trend_sma.unwrap(), 12.2));
}

// ── Entries and exits ───────────────────────────────────────────────

#[test]
fn five_bar_scenario_enters_on_third_bar_and_stays_open() {
    let bars = scenario(
        &[10.0, 10.0, 12.0, 13.0, 12.0],
        &[1.0, 1.0, 2.0, 3.0, 3.0],
        &[2.0, 2.0, 1.0, 1.0, 2.0],
    );
    let out = run(&bars, SimulationConfig::default());

    assert_eq!(out.evaluated_bars, 4);
    assert_eq!(out.ledger.len(), 1);
    assert!(out.ledger.closed_trades().is_empty());
    let open = out.ledger.open_trade().unwrap();
    assert_eq!(open.entry_index, 2);
    assert_eq!(open.entry_price, 12.0);
    assert!(open.exit.is_none());
    assert_eq!(out.final_state, PositionState::Long);
}

#[test]
fn five_bar_scenario_exits_once_short_drops_below_long() {
    let bars = scenario(
        &[10.0, 10.0, 12.0, 13.0, 12.0, 12.0],
        &[1.0, 1.0, 2.0, 3.0, 3.0, 1.0],
        &[2.0, 2.0, 1.0, 1.0, 2.0, 2.0],
    );
    let out = run(&bars, SimulationConfig::default());

    let closed = out.ledger.closed_trades();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].entry_index, 2);
    assert_eq!(closed[0].exit_index, 5);
    assert_eq!(closed[0].exit_price, 12.0);
    assert_eq!(closed[0].exit_reason, ExitReason::CrossDown);
    assert_eq!(closed[0].return_pct(), 0.0);
    assert!(!closed[0].is_loss());
    assert_eq!(out.final_state, PositionState::Flat);
}

#[test]
fn cross_down_and_stop_together_keep_position() {
    let bars = scenario(
        &[10.0, 10.0, 9.5, 9.5],
        &[1.0, 3.0, 1.0, 1.0],
        &[2.0, 2.0, 2.0, 2.0],
    );
    let out = run(&bars, SimulationConfig::default());

    // Bar 2: cross-down and 9.5 < 9.9 both hold, so nothing happens.
    // Bar 3: no cross (short already below), stop alone fires.
    let closed = out.ledger.closed_trades();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].entry_index, 1);
    assert_eq!(closed[0].exit_index, 3);
    assert_eq!(closed[0].exit_reason, ExitReason::StopLoss);
    assert!(close_enough(closed[0].exit_price, 9.9));
    assert!(!out
        .events
        .iter()
        .any(|e| matches!(e, SimEvent::Exit { index: 2, .. })));
}

#[test]
fn cent_level_averages_give_same_signals_at_two_and_three_decimals() {
    let bars = scenario(
        &[10.0, 10.0, 10.0, 10.0],
        &[10.01, 10.03, 10.05, 10.02],
        &[10.02, 10.02, 10.04, 10.04],
    );
    let two = run(
        &bars,
        SimulationConfig {
            crossover_precision: CrossoverPrecision::Decimals(2),
            ..Default::default()
        },
    );
    let three = run(
        &bars,
        SimulationConfig {
            crossover_precision: CrossoverPrecision::Decimals(3),
            ..Default::default()
        },
    );

    let closed = two.ledger.closed_trades();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].entry_index, 1);
    assert_eq!(closed[0].exit_index, 3);
    assert_eq!(closed, three.ledger.closed_trades());
    assert_eq!(two.events, three.events);
}

// ── Guards ──────────────────────────────────────────────────────────

fn session_config() -> SimulationConfig {
    SimulationConfig {
        session: Some(TradingSession::default()),
        ..Default::default()
    }
}

/// Three bars at 09:28, 09:29 and 09:30; only the last is in session.
fn around_the_open(short: &[f64]) -> Vec<AugmentedBar> {
    let open = NaiveDate::from_ymd_opt(2025, 2, 3)
        .unwrap()
        .and_hms_opt(9, 28, 0)
        .unwrap();
    let mut bars = scenario(&[10.0, 10.0, 10.0], short, &[2.0, 2.0, 2.0]);
    for (i, b) in bars.iter_mut().enumerate() {
        b.bar.timestamp = open + chrono::Duration::minutes(i as i64);
    }
    bars
}

#[test]
fn cross_before_the_session_is_not_carried_into_it() {
    // Cross-up at 09:29 is out of session; at 09:30 short was already above.
    let bars = around_the_open(&[1.0, 3.0, 4.0]);
    let out = run(&bars, session_config());
    assert!(out.ledger.is_empty());
    assert_eq!(out.evaluated_bars, 2);
}

#[test]
fn first_session_bar_looks_back_at_the_previous_bar() {
    // The 09:30 bar compares against 09:29, even though 09:29 was out of session.
    let bars = around_the_open(&[1.0, 1.0, 3.0]);
    let out = run(&bars, session_config());
    let trade = &out.ledger.trades()[0];
    assert_eq!(trade.entry_index, 2);
    assert_eq!(trade.entry_time.time().to_string(), "09:30:00");
}

#[test]
fn doji_never_blocks_an_exit() {
    let mut bars = scenario(
        &[10.0, 10.0, 10.5],
        &[1.0, 3.0, 1.0],
        &[2.0, 2.0, 2.0],
    );
    // Entry bar moves; exit bar opens and closes at the same price.
    bars[1].bar.open = 9.8;
    let config = SimulationConfig {
        skip_flat_bars: true,
        ..Default::default()
    };
    let out = run(&bars, config);

    let closed = out.ledger.closed_trades();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].entry_index, 1);
    assert_eq!(closed[0].exit_index, 2);
    assert_eq!(closed[0].exit_price, 10.5);
    assert_eq!(closed[0].exit_reason, ExitReason::CrossDown);
}

#[test]
fn doji_blocks_the_entry_it_would_have_taken() {
    let bars = scenario(&[10.0, 10.0], &[1.0, 3.0], &[2.0, 2.0]);
    let config = SimulationConfig {
        skip_flat_bars: true,
        ..Default::default()
    };
    let out = run(&bars, config);
    assert!(out.ledger.is_empty());
    assert_eq!(out.evaluated_bars, 1);
}

// ── Event log ───────────────────────────────────────────────────────

#[test]
fn events_serialize_with_tag() {
    let bars = scenario(&[10.0, 11.0], &[1.0, 3.0], &[2.0, 2.0]);
    let out = simulate(&bars, SimulationConfig::default()).unwrap();
    let json = serde_json::to_value(&out.events).unwrap();
    assert_eq!(json[0]["event"], "entry");
    assert_eq!(json[0]["index"], 1);
    assert_eq!(json[0]["price"], 11.0);
}
