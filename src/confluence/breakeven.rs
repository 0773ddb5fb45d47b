// =============================================================================
// Breakeven promotion
// =============================================================================
//
//   target_move  = |tp1 - entry|
//   current_move = (price - entry) in the trade's favour
//   triggered when current_move >= target_move * be_threshold
//
// On a freshly generated signal price == entry, so only a zero threshold
// triggers.  The same check is re-run against later prices for a tracked
// setup.
// =============================================================================

use super::levels::RiskLevels;
use crate::types::Direction;

/// Breakeven level (the entry) when promotion is triggered at `price`.
pub fn assess_breakeven(
    direction: Direction,
    levels: &RiskLevels,
    price: f64,
    be_threshold: f64,
) -> Option<f64> {
    let target_move = (levels.tp1 - levels.entry).abs();
    let current_move = (price - levels.entry) * direction.sign();

    if current_move >= target_move * be_threshold {
        Some(levels.entry)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_levels() -> RiskLevels {
        RiskLevels {
            entry: 100.0,
            sl: 90.0,
            tp1: 110.0,
            tp2: 120.0,
        }
    }

    fn short_levels() -> RiskLevels {
        RiskLevels {
            entry: 100.0,
            sl: 110.0,
            tp1: 90.0,
            tp2: 80.0,
        }
    }

    #[test]
    fn fresh_signal_not_promoted() {
        assert!(assess_breakeven(Direction::Bullish, &long_levels(), 100.0, 0.5).is_none());
    }

    #[test]
    fn zero_threshold_promotes_immediately() {
        assert_eq!(
            assess_breakeven(Direction::Bullish, &long_levels(), 100.0, 0.0),
            Some(100.0)
        );
    }

    #[test]
    fn long_promotes_at_threshold() {
        let levels = long_levels();
        assert!(assess_breakeven(Direction::Bullish, &levels, 104.9, 0.5).is_none());
        assert_eq!(assess_breakeven(Direction::Bullish, &levels, 105.0, 0.5), Some(100.0));
        // Adverse move never promotes.
        assert!(assess_breakeven(Direction::Bullish, &levels, 80.0, 0.5).is_none());
    }

    #[test]
    fn short_promotes_on_downside() {
        let levels = short_levels();
        assert_eq!(assess_breakeven(Direction::Bearish, &levels, 95.0, 0.5), Some(100.0));
        assert!(assess_breakeven(Direction::Bearish, &levels, 106.0, 0.5).is_none());
    }
}
