// =============================================================================
// Direction and risk levels
// =============================================================================
//
// Direction: bullish when close[last] > close[last - 4], bearish otherwise.
//
// Levels from entry = last close and volatility = last high - last low
// (floored to entry * 0.001 when the bar has no range):
//
//   Bullish  sl = entry - vol * (1 + sl_buffer)
//            tp1 = entry + risk * rr * 0.5     tp2 = entry + risk * rr
//   Bearish  mirrored.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::market_data::Candle;
use crate::settings::TradingSettings;
use crate::types::Direction;

/// Bars between the two closes compared for momentum.
pub const MOMENTUM_LOOKBACK: usize = 4;
/// Volatility floor as a fraction of entry for zero-range bars.
pub const MIN_VOLATILITY_FRACTION: f64 = 0.001;
/// TP1 sits at this fraction of the full reward target.
pub const TP1_REWARD_FRACTION: f64 = 0.5;

/// Five-bar momentum direction.  `None` when fewer than five candles exist.
pub fn trend_direction(candles: &[Candle]) -> Option<Direction> {
    let last = candles.last()?;
    let reference = candles.len().checked_sub(MOMENTUM_LOOKBACK + 1)?;
    if last.close > candles[reference].close {
        Some(Direction::Bullish)
    } else {
        Some(Direction::Bearish)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub entry: f64,
    pub sl: f64,
    pub tp1: f64,
    pub tp2: f64,
}

/// Stop distance basis for `bar`, never zero-width.
pub fn volatility(bar: &Candle) -> f64 {
    let range = bar.range();
    if range > 0.0 {
        range
    } else {
        bar.close * MIN_VOLATILITY_FRACTION
    }
}

/// Entry, stop and targets for a trade entered at the close of `last`.
pub fn derive_levels(direction: Direction, last: &Candle, settings: &TradingSettings) -> RiskLevels {
    let entry = last.close;
    let sign = direction.sign();

    let sl = entry - sign * volatility(last) * (1.0 + settings.sl_buffer);
    let risk = (entry - sl) * sign;
    let tp1 = entry + sign * risk * settings.risk_reward * TP1_REWARD_FRACTION;
    let tp2 = entry + sign * risk * settings.risk_reward;

    RiskLevels { entry, sl, tp1, tp2 }
}
