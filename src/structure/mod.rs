// =============================================================================
// Structural Probes Module
// =============================================================================
//
// The scorer consumes two boolean structural predicates over the candle
// history, "liquidity swept" and "structure broken", without defining them.
// Each is a `StructureProbe`; the defaults are deterministic swing-based
// detectors, and callers may substitute their own.

pub mod break_of_structure;
pub mod liquidity;
pub mod swing;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::market_data::Candle;

pub use break_of_structure::{BreakOfStructure, StructureBreak};
pub use liquidity::{LiquiditySweep, Sweep};

/// A boolean predicate over the full candle history, evaluated at the
/// latest candle.
pub trait StructureProbe: Send + Sync {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;

    fn detect(&self, candles: &[Candle]) -> bool;
}

/// Probe with a predetermined answer, for predicates sourced elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub bool);

impl StructureProbe for FixedProbe {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn detect(&self, _candles: &[Candle]) -> bool {
        self.0
    }
}

fn default_swing_strength() -> usize {
    2
}

fn default_sweep_lookback() -> usize {
    20
}

/// Tunables for the default swing-based probes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureParams {
    /// Candles required on each side of a swing point.
    #[serde(default = "default_swing_strength")]
    pub swing_strength: usize,

    /// Only swings within this many candles before the latest one can be
    /// swept.
    #[serde(default = "default_sweep_lookback")]
    pub sweep_lookback: usize,
}

impl Default for StructureParams {
    fn default() -> Self {
        Self {
            swing_strength: default_swing_strength(),
            sweep_lookback: default_sweep_lookback(),
        }
    }
}

/// The pair of predicates the scorer consults.
#[derive(Clone)]
pub struct StructureProbes {
    pub liquidity: Arc<dyn StructureProbe>,
    pub structure: Arc<dyn StructureProbe>,
}

impl StructureProbes {
    pub fn from_params(params: &StructureParams) -> Self {
        Self {
            liquidity: Arc::new(LiquiditySweep::new(params.swing_strength, params.sweep_lookback)),
            structure: Arc::new(BreakOfStructure::new(params.swing_strength)),
        }
    }

    /// Both predicates answered up front.
    pub fn fixed(has_liquidity: bool, has_structure: bool) -> Self {
        Self {
            liquidity: Arc::new(FixedProbe(has_liquidity)),
            structure: Arc::new(FixedProbe(has_structure)),
        }
    }
}

impl Default for StructureProbes {
    fn default() -> Self {
        Self::from_params(&StructureParams::default())
    }
}

impl std::fmt::Debug for StructureProbes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureProbes")
            .field("liquidity", &self.liquidity.name())
            .field("structure", &self.structure.name())
            .finish()
    }
}
