// =============================================================================
// Confluence Engine - candles + settings in, zones + ConfluenceState out
// =============================================================================
//
// Pipeline (re-run in full on every update, no state between calls):
//   1. Guard: fewer than MIN_HISTORY candles -> empty zones, score 0, NONE
//   2. Detect every FVG and OB
//   3. Evaluate the four confluence checks at the latest close against all
//      detected zones, then keep the 5 most recent of each for output
//   4. Apply the signal gate
//   5. If it passes: 5-bar momentum direction, risk levels, breakeven
//
// The engine is total over its input: degenerate series produce degenerate
// states, never errors.  It is `Send + Sync` and holds no mutable state, so
// concurrent evaluations are independent.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::confluence::{
    assess_breakeven, check_gates, derive_levels, trend_direction, ConfluenceChecks,
    ConfluenceState, GateVerdict,
};
use crate::market_data::Candle;
use crate::settings::TradingSettings;
use crate::structure::{StructureParams, StructureProbes};
use crate::zones::{detect_zones, FairValueGap, OrderBlock};

/// Minimum candles for any analysis.
pub const MIN_HISTORY: usize = 5;

/// What the rendering layer receives: the retained zones (newest last) and
/// the confluence state at the latest candle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub order_blocks: Vec<OrderBlock>,
    pub fvgs: Vec<FairValueGap>,
    pub confluence: ConfluenceState,
}

/// A snapshot plus the gate verdict that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub snapshot: IndicatorSnapshot,
    pub verdict: GateVerdict,
}

#[derive(Debug, Clone, Default)]
pub struct ConfluenceEngine {
    probes: StructureProbes,
}

impl ConfluenceEngine {
    pub fn new(probes: StructureProbes) -> Self {
        Self { probes }
    }

    /// Engine using the swing-based probes tuned by `params`.
    pub fn with_params(params: &StructureParams) -> Self {
        Self::new(StructureProbes::from_params(params))
    }

    /// Evaluate the latest candle of `candles` under `settings`.
    pub fn evaluate(&self, candles: &[Candle], settings: &TradingSettings) -> Evaluation {
        if candles.len() < MIN_HISTORY {
            debug!(candles = candles.len(), "not enough history for analysis");
            return Evaluation {
                snapshot: IndicatorSnapshot::default(),
                verdict: GateVerdict::InsufficientHistory {
                    candles: candles.len(),
                    required: MIN_HISTORY,
                },
            };
        }

        let all_zones = detect_zones(candles);
        let checks = ConfluenceChecks::evaluate(candles, &all_zones, &self.probes);
        let zones = all_zones.into_recent();
        let verdict = check_gates(&checks, settings);
        let mut confluence = ConfluenceState::from_checks(&checks);

        if verdict.passed() {
            if let (Some(direction), Some(last)) = (trend_direction(candles), candles.last()) {
                let levels = derive_levels(direction, last, settings);
                let be_level =
                    assess_breakeven(direction, &levels, last.close, settings.be_threshold);
                confluence = confluence.with_signal(direction, levels, be_level);
            }
        }

        debug!(
            score = confluence.score,
            has_ob = checks.has_ob,
            has_fvg = checks.has_fvg,
            has_liquidity = checks.has_liquidity,
            has_structure = checks.has_structure,
            fvgs = zones.fvgs.len(),
            order_blocks = zones.order_blocks.len(),
            signal = %confluence.signal,
            verdict = %verdict,
            "confluence evaluation complete"
        );

        Evaluation {
            snapshot: IndicatorSnapshot {
                order_blocks: zones.order_blocks,
                fvgs: zones.fvgs,
                confluence,
            },
            verdict,
        }
    }
}

/// One-shot evaluation with the default structural probes.
pub fn calculate_indicators(candles: &[Candle], settings: &TradingSettings) -> IndicatorSnapshot {
    ConfluenceEngine::default().evaluate(candles, settings).snapshot
}
