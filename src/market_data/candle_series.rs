use std::collections::VecDeque;

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::candle::Candle;

// ---------------------------------------------------------------------------
// CandleSeries -- thread-safe bounded history for the analysed instrument
// ---------------------------------------------------------------------------

/// Thread-safe bounded history of candles, oldest first.
///
/// The last element is treated as the live bar: ticks patch it in place,
/// while a candle with a newer `time` is appended and the history trimmed to
/// `max_candles`.  Readers always receive an owned snapshot so an evaluation
/// never observes a half-applied update.
pub struct CandleSeries {
    candles: RwLock<VecDeque<Candle>>,
    max_candles: usize,
}

impl CandleSeries {
    /// Create an empty series retaining at most `max_candles` bars.
    pub fn new(max_candles: usize) -> Self {
        Self {
            candles: RwLock::new(VecDeque::with_capacity(max_candles)),
            max_candles: max_candles.max(1),
        }
    }

    /// Replace the whole history with a backfilled batch.
    ///
    /// Candles that are not strictly newer than their predecessor are
    /// dropped.  Returns the number of candles kept after trimming.
    pub fn replace_all(&self, batch: Vec<Candle>) -> usize {
        let mut ring: VecDeque<Candle> = VecDeque::with_capacity(self.max_candles);
        let mut dropped = 0usize;
        for candle in batch {
            if ring.back().is_some_and(|last| candle.time <= last.time) {
                dropped += 1;
                continue;
            }
            ring.push_back(candle);
        }
        if dropped > 0 {
            warn!(dropped, "backfill contained out-of-order or duplicate candles");
        }
        while ring.len() > self.max_candles {
            ring.pop_front();
        }
        let kept = ring.len();
        *self.candles.write() = ring;
        kept
    }

    /// Insert a single candle.
    ///
    /// * Same `time` as the last bar: the last bar is replaced.
    /// * Newer `time`: appended and the history trimmed.
    /// * Older `time`: ignored, returns `false`.
    pub fn upsert(&self, candle: Candle) -> bool {
        let mut ring = self.candles.write();
        match ring.back().map(|c| c.time) {
            Some(last_time) if candle.time == last_time => {
                ring.pop_back();
                ring.push_back(candle);
            }
            Some(last_time) if candle.time < last_time => {
                debug!(time = candle.time, last = last_time, "stale candle ignored");
                return false;
            }
            _ => {
                ring.push_back(candle);
                while ring.len() > self.max_candles {
                    ring.pop_front();
                }
            }
        }
        true
    }

    /// Patch the live bar with a new traded price: `close` becomes `price`
    /// and `high`/`low` widen if the tick breaches the existing range.
    ///
    /// Returns the patched candle, or `None` when the series is empty or the
    /// price is not a positive finite number.
    pub fn apply_tick(&self, price: f64) -> Option<Candle> {
        if !price.is_finite() || price <= 0.0 {
            warn!(price, "rejected non-positive or non-finite tick");
            return None;
        }
        let mut ring = self.candles.write();
        let last = ring.back_mut()?;
        *last = last.with_tick(price);
        Some(*last)
    }

    /// Owned snapshot of the full history (oldest first).
    pub fn snapshot(&self) -> Vec<Candle> {
        self.candles.read().iter().copied().collect()
    }

    /// The most recent `count` candles (oldest first).
    pub fn recent(&self, count: usize) -> Vec<Candle> {
        let ring = self.candles.read();
        let start = ring.len().saturating_sub(count);
        ring.iter().skip(start).copied().collect()
    }

    /// The live (last) bar, if any.
    pub fn last(&self) -> Option<Candle> {
        self.candles.read().back().copied()
    }

    pub fn len(&self) -> usize {
        self.candles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.read().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
