// =============================================================================
// Confluence Engine - Smart-money zone detection and signal scoring
// =============================================================================
//
// Given a candle history and trading settings, detects Fair Value Gaps and
// Order Blocks, scores confluence at the latest price, and derives a
// BUY/SELL/NONE signal with entry, stop, two targets and breakeven status.
//
// `engine` is the pure analysis core; `app_state` and `api` wrap it in a
// small service fed by a synthetic candle source and external price quotes.
// =============================================================================

pub mod api;
pub mod app_state;
pub mod confluence;
pub mod decision_envelope;
pub mod engine;
pub mod market_data;
pub mod runtime_config;
pub mod settings;
pub mod structure;
pub mod types;
pub mod zones;

pub use confluence::{ConfluenceState, GateVerdict};
pub use engine::{calculate_indicators, ConfluenceEngine, Evaluation, IndicatorSnapshot};
pub use market_data::Candle;
pub use settings::TradingSettings;
pub use types::{SignalType, ZoneKind};
