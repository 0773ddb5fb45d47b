// =============================================================================
// Trading Settings - caller-owned risk and confluence parameters
// =============================================================================
//
// A read-only snapshot handed to every evaluation.  Any change re-runs the
// whole pipeline against identical candle history.  All fields carry serde
// defaults so partial payloads from the settings UI deserialise cleanly.
// =============================================================================

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Highest achievable confluence score (four independent checks).
pub const MAX_CONFLUENCE: u32 = 4;

fn default_true() -> bool {
    true
}

fn default_min_confluence() -> u32 {
    2
}

fn default_risk_reward() -> f64 {
    2.5
}

fn default_sl_buffer() -> f64 {
    0.1
}

fn default_be_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSettings {
    /// Price must sit inside an order block for a signal.
    #[serde(default = "default_true")]
    pub require_ob: bool,

    /// Price must respect a fair value gap for a signal.
    #[serde(default)]
    pub require_fvg: bool,

    /// Exposed to the settings UI but not consulted when gating.
    #[serde(default = "default_true")]
    pub require_liquidity: bool,

    /// Minimum confluence score, 1..=4.
    #[serde(default = "default_min_confluence")]
    pub min_confluence: u32,

    /// Reward multiple of risk for TP2 (TP1 sits at half of it).
    #[serde(default = "default_risk_reward")]
    pub risk_reward: f64,

    /// Fractional padding added to the volatility-based stop distance.
    #[serde(default = "default_sl_buffer")]
    pub sl_buffer: f64,

    /// Fraction of the distance to TP1 that promotes the stop to entry.
    #[serde(default = "default_be_threshold")]
    pub be_threshold: f64,
}

impl Default for TradingSettings {
    fn default() -> Self {
        Self {
            require_ob: true,
            require_fvg: false,
            require_liquidity: true,
            min_confluence: default_min_confluence(),
            risk_reward: default_risk_reward(),
            sl_buffer: default_sl_buffer(),
            be_threshold: default_be_threshold(),
        }
    }
}

impl TradingSettings {
    /// Check every field against its documented domain.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_CONFLUENCE).contains(&self.min_confluence) {
            bail!(
                "min_confluence must be within 1..={MAX_CONFLUENCE}, got {}",
                self.min_confluence
            );
        }
        if !self.risk_reward.is_finite() || self.risk_reward <= 0.0 {
            bail!("risk_reward must be > 0, got {}", self.risk_reward);
        }
        if !self.sl_buffer.is_finite() || self.sl_buffer < 0.0 {
            bail!("sl_buffer must be >= 0, got {}", self.sl_buffer);
        }
        if !(0.0..=1.0).contains(&self.be_threshold) {
            bail!("be_threshold must be within [0, 1], got {}", self.be_threshold);
        }
        Ok(())
    }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default)]
    pub require_ob: Option<bool>,
    #[serde(default)]
    pub require_fvg: Option<bool>,
    #[serde(default)]
    pub require_liquidity: Option<bool>,
    #[serde(default)]
    pub min_confluence: Option<u32>,
    #[serde(default)]
    pub risk_reward: Option<f64>,
    #[serde(default)]
    pub sl_buffer: Option<f64>,
    #[serde(default)]
    pub be_threshold: Option<f64>,
}

impl SettingsPatch {
    /// `current` with every present field overwritten.  The result is not
    /// validated.
    pub fn apply(&self, current: &TradingSettings) -> TradingSettings {
        TradingSettings {
            require_ob: self.require_ob.unwrap_or(current.require_ob),
            require_fvg: self.require_fvg.unwrap_or(current.require_fvg),
            require_liquidity: self.require_liquidity.unwrap_or(current.require_liquidity),
            min_confluence: self.min_confluence.unwrap_or(current.min_confluence),
            risk_reward: self.risk_reward.unwrap_or(current.risk_reward),
            sl_buffer: self.sl_buffer.unwrap_or(current.sl_buffer),
            be_threshold: self.be_threshold.unwrap_or(current.be_threshold),
        }
    }
}
