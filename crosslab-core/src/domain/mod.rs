//! Domain types for crosslab

pub mod bar;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use position::PositionState;
pub use trade::{ClosedTrade, ExitReason, Trade, TradeEntry, TradeExit};
