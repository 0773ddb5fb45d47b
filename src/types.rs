// =============================================================================
// Shared types used across the confluence engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Directional tag carried by every detected zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneKind {
    Bullish,
    Bearish,
}

impl std::fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "BULLISH"),
            Self::Bearish => write!(f, "BEARISH"),
        }
    }
}

/// Outcome of one evaluation. `None` is the only initial state; every call
/// re-derives the signal from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    Buy,
    Sell,
    None,
}

impl Default for SignalType {
    fn default() -> Self {
        Self::None
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::None => write!(f, "NONE"),
        }
    }
}

/// Trade direction once gating has passed. There is no neutral outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    pub fn signal(self) -> SignalType {
        match self {
            Self::Bullish => SignalType::Buy,
            Self::Bearish => SignalType::Sell,
        }
    }

    /// +1.0 for bullish, -1.0 for bearish. Multiplying a raw price delta by
    /// this yields the move in the trade's favour.
    pub fn sign(self) -> f64 {
        match self {
            Self::Bullish => 1.0,
            Self::Bearish => -1.0,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Bearish => write!(f, "Bearish"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_defaults_to_none() {
        assert_eq!(SignalType::default(), SignalType::None);
    }

    #[test]
    fn wire_names_are_upper_case() {
        assert_eq!(serde_json::to_string(&SignalType::Buy).unwrap(), "\"BUY\"");
        assert_eq!(serde_json::to_string(&ZoneKind::Bearish).unwrap(), "\"BEARISH\"");
        let parsed: SignalType = serde_json::from_str("\"NONE\"").unwrap();
        assert_eq!(parsed, SignalType::None);
    }

    #[test]
    fn direction_maps_to_signal() {
        assert_eq!(Direction::Bullish.signal(), SignalType::Buy);
        assert_eq!(Direction::Bearish.signal(), SignalType::Sell);
        assert_eq!(Direction::Bearish.sign(), -1.0);
    }
}
