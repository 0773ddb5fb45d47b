// =============================================================================
// Mock Feed - Synthetic candle history and live drift ticks
// =============================================================================
//
// Stands in for a real data-acquisition collaborator.  Two pieces:
//
//   1. `generate_candles` - backfills `count` bars ending at "now", each bar
//      opening at the previous close with a 0.1 % volatility random walk and
//      a slight upward bias:
//
//        change = (u - 0.48) * price * 0.001
//        high   = max(open, close) + u * price * 0.001 * 0.3
//        low    = min(open, close) - u * price * 0.001 * 0.3
//
//   2. `drift_close` - the periodic live tick.  The last close is pulled 10 %
//      of the way toward a target price (the latest external quote, if any)
//      plus a 0.01 % jitter.
//
// All randomness goes through a caller-supplied `Rng`, so a seeded `StdRng`
// gives reproducible series in tests.
// =============================================================================

use std::str::FromStr;

use anyhow::bail;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::candle::Candle;

/// Per-bar volatility as a fraction of price.
const BAR_VOLATILITY: f64 = 0.001;
/// Centre of the random walk; below 0.5 gives a slight upward bias.
const WALK_BIAS: f64 = 0.48;
/// Wick extension as a fraction of bar volatility.
const WICK_FRACTION: f64 = 0.3;
/// Upper bound (exclusive) for synthetic volume.
const MAX_VOLUME: u64 = 1000;

/// Fraction of the gap to the target closed on each live tick.
const DRIFT_PULL: f64 = 0.1;
/// Live tick jitter as a fraction of the target price.
const TICK_JITTER: f64 = 0.0001;

// =============================================================================
// Timeframe
// =============================================================================

/// Bar interval of the analysed series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "15M")]
    M15,
    #[serde(rename = "1H")]
    H1,
    #[serde(rename = "4H")]
    H4,
}

impl Timeframe {
    pub fn interval_ms(self) -> i64 {
        match self {
            Self::M15 => 15 * 60 * 1000,
            Self::H1 => 60 * 60 * 1000,
            Self::H4 => 4 * 60 * 60 * 1000,
        }
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::M15
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::M15 => write!(f, "15M"),
            Self::H1 => write!(f, "1H"),
            Self::H4 => write!(f, "4H"),
        }
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "15M" => Ok(Self::M15),
            "1H" => Ok(Self::H1),
            "4H" => Ok(Self::H4),
            other => bail!("unsupported timeframe '{other}' (expected 15M, 1H or 4H)"),
        }
    }
}

// =============================================================================
// Generation
// =============================================================================

/// Generate `count` synthetic candles starting at `base_price`, the last bar
/// opening one interval before `now_ms`.
pub fn generate_candles<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    base_price: f64,
    timeframe: Timeframe,
    now_ms: i64,
) -> Vec<Candle> {
    let interval = timeframe.interval_ms();
    let mut time = now_ms - count as i64 * interval;
    let mut price = base_price;
    let mut candles = Vec::with_capacity(count);

    for _ in 0..count {
        let volatility = price * BAR_VOLATILITY;
        let change = (rng.gen::<f64>() - WALK_BIAS) * volatility;

        let open = price;
        let close = price + change;
        let high = open.max(close) + rng.gen::<f64>() * volatility * WICK_FRACTION;
        let low = open.min(close) - rng.gen::<f64>() * volatility * WICK_FRACTION;
        let volume = rng.gen_range(0..MAX_VOLUME);

        candles.push(Candle::new(time, open, high, low, close, volume));

        price = close;
        time += interval;
    }

    candles
}

/// Next live close for the in-progress bar.  `target` is the latest external
/// quote; without one the bar only jitters around its own close.
pub fn drift_close<R: Rng + ?Sized>(rng: &mut R, last_close: f64, target: Option<f64>) -> f64 {
    let target = target.unwrap_or(last_close);
    let drift = (target - last_close) * DRIFT_PULL;
    let jitter = (rng.gen::<f64>() - 0.5) * target * TICK_JITTER;
    last_close + drift + jitter
}
