// =============================================================================
// Runtime Configuration - Hot-reloadable engine settings with atomic save
// =============================================================================
//
// Central configuration for the confluence service: the analysed instrument,
// the synthetic feed, the HTTP bind address and the trading settings handed
// to every evaluation.  Settings changed through the API are written back on
// shutdown so they survive a restart.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry serde defaults so that adding new fields never
// breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::market_data::Timeframe;
use crate::settings::TradingSettings;
use crate::structure::StructureParams;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_asset() -> String {
    "XAUUSD".to_string()
}

fn default_candle_count() -> usize {
    100
}

fn default_base_price() -> f64 {
    2500.0
}

fn default_max_candles() -> usize {
    500
}

fn default_refresh_interval_ms() -> u64 {
    2000
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Instrument ---------------------------------------------------------

    /// Symbol being analysed.
    #[serde(default = "default_asset")]
    pub asset: String,

    #[serde(default)]
    pub timeframe: Timeframe,

    // --- Synthetic feed -----------------------------------------------------

    /// Candles generated on (re)seed.
    #[serde(default = "default_candle_count")]
    pub candle_count: usize,

    /// Opening price of a freshly seeded series.
    #[serde(default = "default_base_price")]
    pub base_price: f64,

    /// History retained by the candle series.
    #[serde(default = "default_max_candles")]
    pub max_candles: usize,

    /// Period of the live drift tick.  0 disables it.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    // --- Service ------------------------------------------------------------

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // --- Analysis -----------------------------------------------------------

    #[serde(default)]
    pub settings: TradingSettings,

    /// Swing parameters for the liquidity and structure probes.
    #[serde(default)]
    pub structure: StructureParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            asset: default_asset(),
            timeframe: Timeframe::default(),
            candle_count: default_candle_count(),
            base_price: default_base_price(),
            max_candles: default_max_candles(),
            refresh_interval_ms: default_refresh_interval_ms(),
            bind_addr: default_bind_addr(),
            settings: TradingSettings::default(),
            structure: StructureParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid runtime config in {}", path.display()))?;

        info!(
            path = %path.display(),
            asset = %config.asset,
            timeframe = %config.timeframe,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.asset.trim().is_empty() {
            bail!("asset must not be empty");
        }
        if !self.base_price.is_finite() || self.base_price <= 0.0 {
            bail!("base_price must be > 0, got {}", self.base_price);
        }
        if self.max_candles == 0 {
            bail!("max_candles must be > 0");
        }
        self.settings.validate()
    }
}
