//! Position state of the single-asset, long-only simulator.

use serde::{Deserialize, Serialize};

/// Exactly one of these holds at every simulated bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionState {
    #[default]
    Flat,
    Long,
}
