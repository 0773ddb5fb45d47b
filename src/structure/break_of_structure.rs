// =============================================================================
// Break of Structure (BOS) probe
// =============================================================================
//
// Structure is broken when the latest close is strictly beyond the most
// recent confirmed swing high (bullish break) or swing low (bearish break).
// Swings are confirmed on the history before the latest candle.

use serde::Serialize;

use super::swing::{find_swings, last_swing_high, last_swing_low};
use super::StructureProbe;
use crate::market_data::Candle;
use crate::types::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StructureBreak {
    pub direction: Direction,
    pub level: f64,
}

#[derive(Debug, Clone)]
pub struct BreakOfStructure {
    pub swing_strength: usize,
}

impl BreakOfStructure {
    pub fn new(swing_strength: usize) -> Self {
        Self { swing_strength }
    }

    pub fn structure_break(&self, candles: &[Candle]) -> Option<StructureBreak> {
        let (last, history) = candles.split_last()?;
        let swings = find_swings(history, self.swing_strength);

        if let Some(high) = last_swing_high(&swings, 0) {
            if last.close > high.price {
                return Some(StructureBreak {
                    direction: Direction::Bullish,
                    level: high.price,
                });
            }
        }

        if let Some(low) = last_swing_low(&swings, 0) {
            if last.close < low.price {
                return Some(StructureBreak {
                    direction: Direction::Bearish,
                    level: low.price,
                });
            }
        }

        None
    }
}

impl StructureProbe for BreakOfStructure {
    fn name(&self) -> &'static str {
        "break_of_structure"
    }

    fn detect(&self, candles: &[Candle]) -> bool {
        self.structure_break(candles).is_some()
    }
}
