// =============================================================================
// Candle - immutable OHLCV record and small numeric helpers
// =============================================================================
//
// The engine only ever reads candles.  Well-formedness (high >= max(open,
// close), low <= min(open, close), strictly increasing `time`) is owned by
// whichever collaborator produced the series.

use serde::{Deserialize, Serialize};

/// A single OHLCV bar.  `time` is the bar's open timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Absolute size of the candle body.
    pub fn body_size(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Full high-to-low range.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Return a copy with `close` moved to `price` and the range widened to
    /// include it.  Used for live ticks against the in-progress bar.
    pub fn with_tick(&self, price: f64) -> Self {
        Self {
            close: price,
            high: self.high.max(price),
            low: self.low.min(price),
            ..*self
        }
    }

    /// Finite prices with `low <= min(open, close)` and
    /// `high >= max(open, close)`.
    pub fn is_well_formed(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite())
            && self.low <= self.open.min(self.close)
            && self.high >= self.open.max(self.close)
    }
}

/// Mean absolute body size of the (up to) `window` candles that precede
/// `index`.
///
/// The window is clamped to `max(0, index - window)..index`, so near the
/// start of a series it is shorter than `window`.  Returns `None` when the
/// clamped window is empty.
pub fn mean_body_before(candles: &[Candle], index: usize, window: usize) -> Option<f64> {
    let end = index.min(candles.len());
    let start = end.saturating_sub(window);
    let slice = &candles[start..end];
    if slice.is_empty() {
        return None;
    }
    let total: f64 = slice.iter().map(Candle::body_size).sum();
    Some(total / slice.len() as f64)
}
