// =============================================================================
// Confluence Scorer - four independent checks and signal gating
// =============================================================================
//
// Checks against the latest close P:
//   has_ob         P inside [bottom, top] of any order block
//   has_fvg        any bullish gap with P >= bottom, or bearish gap with P <= top
//   has_liquidity  liquidity probe over the full history
//   has_structure  structure probe over the full history
//
// score = number of true checks (0..=4).
//
// Gate: score >= min_confluence AND (has_ob OR !require_ob)
//                              AND (has_fvg OR !require_fvg)
// `require_liquidity` is deliberately not part of the gate.
// =============================================================================

use serde::Serialize;

use crate::market_data::Candle;
use crate::settings::TradingSettings;
use crate::structure::StructureProbes;
use crate::zones::DetectedZones;

/// Result of the four zone/structure checks at one price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfluenceChecks {
    pub has_ob: bool,
    pub has_fvg: bool,
    pub has_liquidity: bool,
    pub has_structure: bool,
}

impl ConfluenceChecks {
    /// Evaluate all checks for the latest close of `candles`.
    pub fn evaluate(
        candles: &[Candle],
        zones: &DetectedZones,
        probes: &StructureProbes,
    ) -> Self {
        let Some(last) = candles.last() else {
            return Self::default();
        };
        let price = last.close;

        Self {
            has_ob: zones.order_blocks.iter().any(|ob| ob.contains(price)),
            has_fvg: zones.fvgs.iter().any(|gap| gap.is_respected_by(price)),
            has_liquidity: probes.liquidity.detect(candles),
            has_structure: probes.structure.detect(candles),
        }
    }

    /// Count of true checks.
    pub fn score(&self) -> u32 {
        [self.has_ob, self.has_fvg, self.has_liquidity, self.has_structure]
            .iter()
            .filter(|&&check| check)
            .count() as u32
    }
}

// =============================================================================
// Gate verdict
// =============================================================================

/// Why an evaluation did or did not produce a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum GateVerdict {
    Pass,
    InsufficientHistory { candles: usize, required: usize },
    BelowMinConfluence { score: u32, required: u32 },
    MissingOrderBlock,
    MissingFairValueGap,
}

impl GateVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Short name of the gate, for audit records.
    pub fn gate_name(&self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::InsufficientHistory { .. } => "InsufficientHistory",
            Self::BelowMinConfluence { .. } => "MinConfluence",
            Self::MissingOrderBlock => "RequireOB",
            Self::MissingFairValueGap => "RequireFVG",
        }
    }
}

impl std::fmt::Display for GateVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "all gates passed"),
            Self::InsufficientHistory { candles, required } => {
                write!(f, "insufficient history: {candles} < {required} candles")
            }
            Self::BelowMinConfluence { score, required } => {
                write!(f, "confluence score {score} below minimum {required}")
            }
            Self::MissingOrderBlock => write!(f, "order block required but price is outside all OBs"),
            Self::MissingFairValueGap => write!(f, "fair value gap required but none is respected"),
        }
    }
}

/// Apply the signal gate.
pub fn check_gates(checks: &ConfluenceChecks, settings: &TradingSettings) -> GateVerdict {
    let score = checks.score();
    if score < settings.min_confluence {
        return GateVerdict::BelowMinConfluence {
            score,
            required: settings.min_confluence,
        };
    }
    if settings.require_ob && !checks.has_ob {
        return GateVerdict::MissingOrderBlock;
    }
    if settings.require_fvg && !checks.has_fvg {
        return GateVerdict::MissingFairValueGap;
    }
    GateVerdict::Pass
}
