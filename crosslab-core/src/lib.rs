//! CrossLab Core: domain types, moving averages, data providers and the
//! position simulator.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, trades, position state)
//! - SMA/WMA moving averages and bar augmentation
//! - Bar providers (CSV, in-memory, synthetic)
//! - Flat/Long position simulator and its trade ledger

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}
