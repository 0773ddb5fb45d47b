// =============================================================================
// Order Block (OB) detection - last candle before an impulse move
// =============================================================================
//
// For each index i in 1..=len-3, `prev = candles[i]` and
// `impulse = candles[i + 1]`.  The impulse qualifies when its body is more
// than IMPULSE_BODY_MULTIPLE times the mean body of the (up to) BODY_WINDOW
// candles preceding i.  The window is clamped at the start of the series; an
// empty window never qualifies.
//
// The zone is `prev`'s full range, tagged with `prev.time`, and inherits the
// impulse direction.  Mitigation is not tracked: `is_mitigated` is always
// false at creation.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::market_data::candle::mean_body_before;
use crate::market_data::Candle;
use crate::types::ZoneKind;

/// Number of candles averaged to establish the "normal" body size.
pub const BODY_WINDOW: usize = 5;
/// An impulse body must exceed this multiple of the average body.
pub const IMPULSE_BODY_MULTIPLE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    pub kind: ZoneKind,
    pub top: f64,
    pub bottom: f64,
    pub start_time: i64,
    pub is_mitigated: bool,
}

impl OrderBlock {
    /// Direction-agnostic containment of `price` in `[bottom, top]`.
    pub fn contains(&self, price: f64) -> bool {
        price >= self.bottom && price <= self.top
    }
}

/// Whether `impulse` counts as an impulse move relative to the candles
/// before `index`.
fn is_impulse(candles: &[Candle], index: usize, impulse: &Candle) -> bool {
    match mean_body_before(candles, index, BODY_WINDOW) {
        Some(avg_body) => impulse.body_size() > avg_body * IMPULSE_BODY_MULTIPLE,
        None => false,
    }
}

/// Every order block in the series, oldest first.
pub fn detect_order_blocks(candles: &[Candle]) -> Vec<OrderBlock> {
    let mut blocks = Vec::new();
    if candles.len() < 3 {
        return blocks;
    }

    // The final candle is never the impulse: i + 1 <= len - 2.
    for i in 1..candles.len() - 2 {
        let prev = &candles[i];
        let impulse = &candles[i + 1];

        if !is_impulse(candles, i, impulse) {
            continue;
        }

        let kind = if impulse.is_bullish() {
            ZoneKind::Bullish
        } else {
            ZoneKind::Bearish
        };

        blocks.push(OrderBlock {
            kind,
            top: prev.high,
            bottom: prev.low,
            start_time: prev.time,
            is_mitigated: false,
        });
    }

    blocks
}
