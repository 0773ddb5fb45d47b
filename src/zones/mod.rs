// =============================================================================
// Zone Detector
// =============================================================================
//
// Single pass over the candle slice producing Fair Value Gaps and Order
// Blocks.  Pure function of its input; nothing is cached between calls.
// The scorer tests price against every detected zone; the rendered output
// only carries the MAX_ZONES most recent of each kind.

pub mod fvg;
pub mod order_block;

use serde::{Deserialize, Serialize};

use crate::market_data::Candle;

pub use fvg::{detect_fair_value_gaps, FairValueGap};
pub use order_block::{detect_order_blocks, OrderBlock};

/// Zones of each kind retained for scoring and rendering.
pub const MAX_ZONES: usize = 5;

/// Keep the `max` most recent entries, preserving their original order.
pub fn retain_recent<T>(mut zones: Vec<T>, max: usize) -> Vec<T> {
    let excess = zones.len().saturating_sub(max);
    zones.drain(..excess);
    zones
}

/// Zones detected on one candle snapshot, each list newest-last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedZones {
    pub fvgs: Vec<FairValueGap>,
    pub order_blocks: Vec<OrderBlock>,
}

impl DetectedZones {
    /// The [`MAX_ZONES`] most recent zones of each kind.
    pub fn into_recent(self) -> Self {
        Self {
            fvgs: retain_recent(self.fvgs, MAX_ZONES),
            order_blocks: retain_recent(self.order_blocks, MAX_ZONES),
        }
    }
}

/// Detect every zone of both kinds, untrimmed.
pub fn detect_zones(candles: &[Candle]) -> DetectedZones {
    DetectedZones {
        fvgs: detect_fair_value_gaps(candles),
        order_blocks: detect_order_blocks(candles),
    }
}
