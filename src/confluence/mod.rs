// =============================================================================
// Confluence Module
// =============================================================================
//
// Scoring, gating, risk-level derivation and breakeven promotion for the
// latest candle, plus the `ConfluenceState` handed to the rendering layer.

pub mod breakeven;
pub mod levels;
pub mod scorer;

use serde::{Deserialize, Serialize};

use crate::types::{Direction, SignalType};

pub use breakeven::assess_breakeven;
pub use levels::{derive_levels, trend_direction, RiskLevels};
pub use scorer::{check_gates, ConfluenceChecks, GateVerdict};

/// Engine output for one evaluation.
///
/// When `signal` is `None` the level fields are absent and
/// `is_be_triggered` is false.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceState {
    pub score: u32,
    pub has_ob: bool,
    pub has_fvg: bool,
    pub has_liquidity: bool,
    pub has_structure: bool,
    pub signal: SignalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp2: Option<f64>,
    pub is_be_triggered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub be_level: Option<f64>,
}

impl ConfluenceState {
    /// Checks and score only, no signal.
    pub fn from_checks(checks: &ConfluenceChecks) -> Self {
        Self {
            score: checks.score(),
            has_ob: checks.has_ob,
            has_fvg: checks.has_fvg,
            has_liquidity: checks.has_liquidity,
            has_structure: checks.has_structure,
            ..Self::default()
        }
    }

    /// Attach a directional signal with its levels and breakeven outcome.
    pub fn with_signal(
        mut self,
        direction: Direction,
        levels: RiskLevels,
        be_level: Option<f64>,
    ) -> Self {
        self.signal = direction.signal();
        self.entry = Some(levels.entry);
        self.sl = Some(levels.sl);
        self.tp1 = Some(levels.tp1);
        self.tp2 = Some(levels.tp2);
        self.is_be_triggered = be_level.is_some();
        self.be_level = be_level;
        self
    }

    pub fn direction(&self) -> Option<Direction> {
        match self.signal {
            SignalType::Buy => Some(Direction::Bullish),
            SignalType::Sell => Some(Direction::Bearish),
            SignalType::None => None,
        }
    }

    /// Entry, stop and targets when a signal is present.
    pub fn levels(&self) -> Option<RiskLevels> {
        Some(RiskLevels {
            entry: self.entry?,
            sl: self.sl?,
            tp1: self.tp1?,
            tp2: self.tp2?,
        })
    }
}
