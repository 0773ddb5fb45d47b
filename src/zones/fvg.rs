// =============================================================================
// Fair Value Gap (FVG) detection - three-candle imbalance
// =============================================================================
//
// For every consecutive triplet (c1, c2, c3):
//
//   Bullish FVG  if c3.low  > c1.high   band [c1.high, c3.low]
//   Bearish FVG  if c3.high < c1.low    band [c3.high, c1.low]
//
// The zone is tagged with c2's timestamp.  Bullish is tested first; the two
// conditions cannot both hold for a well-formed triplet.  No merging of
// overlapping gaps and no fill tracking.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::market_data::Candle;
use crate::types::ZoneKind;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FairValueGap {
    pub kind: ZoneKind,
    pub top: f64,
    pub bottom: f64,
    /// Time of the middle candle of the forming triplet.
    pub start_time: i64,
}

impl FairValueGap {
    /// "Gap not yet fully filled" test used by the scorer: a bullish gap is
    /// live while price holds at or above its bottom, a bearish gap while
    /// price holds at or below its top.
    pub fn is_respected_by(&self, price: f64) -> bool {
        match self.kind {
            ZoneKind::Bullish => price >= self.bottom,
            ZoneKind::Bearish => price <= self.top,
        }
    }
}

/// Classify a single triplet.
pub fn classify_triplet(c1: &Candle, c2: &Candle, c3: &Candle) -> Option<FairValueGap> {
    if c3.low > c1.high {
        Some(FairValueGap {
            kind: ZoneKind::Bullish,
            top: c3.low,
            bottom: c1.high,
            start_time: c2.time,
        })
    } else if c3.high < c1.low {
        Some(FairValueGap {
            kind: ZoneKind::Bearish,
            top: c1.low,
            bottom: c3.high,
            start_time: c2.time,
        })
    } else {
        None
    }
}

/// Every FVG in the series, oldest first.
pub fn detect_fair_value_gaps(candles: &[Candle]) -> Vec<FairValueGap> {
    candles
        .windows(3)
        .filter_map(|w| classify_triplet(&w[0], &w[1], &w[2]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(time: i64, high: f64, low: f64) -> Candle {
        let mid = (high + low) / 2.0;
        Candle::new(time, mid, high, low, mid, 1)
    }

    #[test]
    fn bullish_gap() {
        let candles = vec![
            candle(1, 101.0, 99.0),
            candle(2, 106.0, 100.0),
            candle(3, 108.0, 103.0),
        ];
        let fvgs = detect_fair_value_gaps(&candles);
        assert_eq!(fvgs.len(), 1);
        let gap = fvgs[0];
        assert_eq!(gap.kind, ZoneKind::Bullish);
        assert_eq!(gap.bottom, 101.0);
        assert_eq!(gap.top, 103.0);
        assert_eq!(gap.start_time, 2);
    }

    #[test]
    fn bearish_gap() {
        let candles = vec![
            candle(1, 101.0, 99.0),
            candle(2, 100.0, 94.0),
            candle(3, 97.0, 92.0),
        ];
        let fvgs = detect_fair_value_gaps(&candles);
        assert_eq!(fvgs.len(), 1);
        let gap = fvgs[0];
        assert_eq!(gap.kind, ZoneKind::Bearish);
        assert_eq!(gap.top, 99.0);
        assert_eq!(gap.bottom, 97.0);
        assert_eq!(gap.start_time, 2);
    }

    #[test]
    fn touching_extremes_is_not_a_gap() {
        let candles = vec![
            candle(1, 101.0, 99.0),
            candle(2, 103.0, 100.0),
            candle(3, 104.0, 101.0),
        ];
        assert!(detect_fair_value_gaps(&candles).is_empty());
    }

    #[test]
    fn short_series_has_no_gaps() {
        assert!(detect_fair_value_gaps(&[]).is_empty());
        assert!(detect_fair_value_gaps(&[candle(1, 1.0, 0.5), candle(2, 3.0, 2.0)]).is_empty());
    }

    #[test]
    fn every_qualifying_triplet_emits() {
        // Steadily gapping up: each triplet (i-2, i-1, i) qualifies.
        let candles: Vec<Candle> = (0..6)
            .map(|i| {
                let base = 100.0 + i as f64 * 3.0;
                candle(i, base + 1.0, base - 1.0)
            })
            .collect();
        let fvgs = detect_fair_value_gaps(&candles);
        assert_eq!(fvgs.len(), 4);
        let times: Vec<i64> = fvgs.iter().map(|g| g.start_time).collect();
        assert_eq!(times, vec![1, 2, 3, 4]);
    }

    #[test]
    fn respected_test_is_asymmetric() {
        let bull = FairValueGap { kind: ZoneKind::Bullish, top: 105.0, bottom: 100.0, start_time: 0 };
        assert!(bull.is_respected_by(100.0));
        assert!(bull.is_respected_by(150.0));
        assert!(!bull.is_respected_by(99.9));

        let bear = FairValueGap { kind: ZoneKind::Bearish, top: 105.0, bottom: 100.0, start_time: 0 };
        assert!(bear.is_respected_by(105.0));
        assert!(bear.is_respected_by(50.0));
        assert!(!bear.is_respected_by(105.1));
    }
}
