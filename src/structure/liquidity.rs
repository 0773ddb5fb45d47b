// =============================================================================
// Liquidity Sweep probe
// =============================================================================
//
// A sweep is a stop-run: the latest candle trades through the most recent
// confirmed swing extreme and then closes back inside it.
//
//   Buy-side sweep   last.high > swing_high  and  last.close <= swing_high
//   Sell-side sweep  last.low  < swing_low   and  last.close >= swing_low
//
// Swings are confirmed on the history *before* the latest candle and must
// sit within the last `lookback` candles of that history.

use serde::Serialize;

use super::swing::{find_swings, last_swing_high, last_swing_low};
use super::StructureProbe;
use crate::market_data::Candle;
use crate::types::Direction;

/// Details of a detected sweep.  `direction` is the implied reversal: a
/// swept high is bearish, a swept low bullish.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sweep {
    pub direction: Direction,
    pub level: f64,
}

#[derive(Debug, Clone)]
pub struct LiquiditySweep {
    pub swing_strength: usize,
    pub lookback: usize,
}

impl LiquiditySweep {
    pub fn new(swing_strength: usize, lookback: usize) -> Self {
        Self {
            swing_strength,
            lookback,
        }
    }

    /// Evaluate the latest candle.  When both extremes are swept by an
    /// outside bar the buy-side sweep is reported.
    pub fn sweep(&self, candles: &[Candle]) -> Option<Sweep> {
        let (last, history) = candles.split_last()?;
        let swings = find_swings(history, self.swing_strength);
        let from = history.len().saturating_sub(self.lookback);

        if let Some(high) = last_swing_high(&swings, from) {
            if last.high > high.price && last.close <= high.price {
                return Some(Sweep {
                    direction: Direction::Bearish,
                    level: high.price,
                });
            }
        }

        if let Some(low) = last_swing_low(&swings, from) {
            if last.low < low.price && last.close >= low.price {
                return Some(Sweep {
                    direction: Direction::Bullish,
                    level: low.price,
                });
            }
        }

        None
    }
}

impl StructureProbe for LiquiditySweep {
    fn name(&self) -> &'static str {
        "liquidity_sweep"
    }

    fn detect(&self, candles: &[Candle]) -> bool {
        self.sweep(candles).is_some()
    }
}
