// =============================================================================
// Swing points - fractal highs and lows
// =============================================================================
//
// Index j is a swing high when its high is strictly greater than the highs of
// the `strength` candles on each side; swing lows mirror this on the lows.
// A swing is only confirmed once `strength` candles have printed after it.

use crate::market_data::Candle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
    pub is_high: bool,
}

/// All confirmed swing points in `candles`, in index order.
pub fn find_swings(candles: &[Candle], strength: usize) -> Vec<SwingPoint> {
    let mut swings = Vec::new();
    if strength == 0 || candles.len() < strength * 2 + 1 {
        return swings;
    }

    for i in strength..candles.len() - strength {
        let current = &candles[i];
        let neighbours = (i - strength..i).chain(i + 1..=i + strength);

        let mut is_high = true;
        let mut is_low = true;
        for j in neighbours {
            is_high &= current.high > candles[j].high;
            is_low &= current.low < candles[j].low;
        }

        if is_high {
            swings.push(SwingPoint { index: i, price: current.high, is_high: true });
        }
        if is_low {
            swings.push(SwingPoint { index: i, price: current.low, is_high: false });
        }
    }

    swings
}

/// Most recent confirmed swing high at or after `from_index`.
pub fn last_swing_high(swings: &[SwingPoint], from_index: usize) -> Option<SwingPoint> {
    swings
        .iter()
        .rev()
        .find(|s| s.is_high && s.index >= from_index)
        .copied()
}

/// Most recent confirmed swing low at or after `from_index`.
pub fn last_swing_low(swings: &[SwingPoint], from_index: usize) -> Option<SwingPoint> {
    swings
        .iter()
        .rev()
        .find(|s| !s.is_high && s.index >= from_index)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hl(time: i64, high: f64, low: f64) -> Candle {
        let mid = (high + low) / 2.0;
        Candle::new(time, mid, high, low, mid, 1)
    }

    #[test]
    fn finds_peak_and_trough() {
        let candles = vec![
            hl(0, 101.0, 99.0),
            hl(1, 102.0, 100.0),
            hl(2, 105.0, 101.0), // swing high
            hl(3, 103.0, 98.0),
            hl(4, 102.0, 95.0), // swing low
            hl(5, 103.0, 97.0),
            hl(6, 104.0, 99.0),
        ];
        let swings = find_swings(&candles, 2);
        assert_eq!(
            swings,
            vec![
                SwingPoint { index: 2, price: 105.0, is_high: true },
                SwingPoint { index: 4, price: 95.0, is_high: false },
            ]
        );
        assert_eq!(last_swing_high(&swings, 0).map(|s| s.index), Some(2));
        assert_eq!(last_swing_low(&swings, 0).map(|s| s.price), Some(95.0));
        assert!(last_swing_high(&swings, 3).is_none());
    }

    #[test]
    fn equal_highs_are_not_swings() {
        let candles = vec![
            hl(0, 100.0, 99.0),
            hl(1, 101.0, 99.5),
            hl(2, 102.0, 100.0),
            hl(3, 102.0, 100.5),
            hl(4, 101.0, 100.2),
        ];
        assert!(find_swings(&candles, 1).iter().all(|s| !s.is_high));
    }

    #[test]
    fn too_short_or_zero_strength() {
        let candles = vec![hl(0, 1.0, 0.0), hl(1, 2.0, 1.0), hl(2, 1.0, 0.0)];
        assert!(find_swings(&candles, 2).is_empty());
        assert!(find_swings(&candles, 0).is_empty());
        assert_eq!(find_swings(&candles, 1).len(), 1);
    }
}
