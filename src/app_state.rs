// =============================================================================
// Central Application State - Confluence Service
// =============================================================================
//
// The single source of truth for the service.  Holds the candle history,
// the latest external quote, the runtime configuration and the most recent
// evaluation, and provides a unified snapshot for the REST API and the
// WebSocket feed.
//
// Every mutation (backfill, price sync, drift tick, settings change) ends in
// `reevaluate`, which runs the engine over a full snapshot of candles and
// settings.  The last input wins; evaluations never observe a half-applied
// update.
//
// Thread safety:
//   - Atomic counters for lock-free version tracking.
//   - parking_lot::RwLock for all mutable shared values.
//   - parking_lot::Mutex serializing snapshot -> evaluate -> publish, so a
//     slower evaluation of older candles can never overwrite a newer one.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::confluence::{assess_breakeven, GateVerdict, RiskLevels};
use crate::decision_envelope::DecisionEnvelope;
use crate::engine::{ConfluenceEngine, Evaluation, IndicatorSnapshot};
use crate::market_data::mock_feed::{drift_close, generate_candles};
use crate::market_data::{Candle, CandleSeries, LivePrice, Timeframe};
use crate::runtime_config::RuntimeConfig;
use crate::settings::{SettingsPatch, TradingSettings};
use crate::types::{Direction, SignalType};

/// Maximum number of recent decisions to retain.
const MAX_RECENT_DECISIONS: usize = 100;

// =============================================================================
// Tracked setup
// =============================================================================

/// Entry context of the signal currently being followed.
///
/// Levels are fixed when the signal first appears; only the breakeven
/// promotion is re-assessed as the price moves.  Once promoted the stop
/// stays at entry for the life of the setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackedSetup {
    pub direction: Direction,
    pub levels: RiskLevels,
    pub be_level: Option<f64>,
}

impl TrackedSetup {
    fn reassess(&mut self, price: f64, be_threshold: f64) {
        if self.be_level.is_none() {
            self.be_level = assess_breakeven(self.direction, &self.levels, price, be_threshold);
            if let Some(level) = self.be_level {
                info!(direction = %self.direction, price, be_level = level, "stop promoted to breakeven");
            }
        }
    }
}

// =============================================================================
// Settings update
// =============================================================================

/// Body of a settings change: instrument selection plus a partial
/// `TradingSettings`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub timeframe: Option<Timeframe>,
    #[serde(flatten)]
    pub patch: SettingsPatch,
}

// =============================================================================
// AppState
// =============================================================================

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Monotonically increasing version counter.  Incremented on every
    /// meaningful state mutation; the WebSocket feed pushes on change.
    pub state_version: AtomicU64,

    /// WebSocket message sequence number (incremented per message sent).
    pub ws_sequence_number: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    // ── Market Data ─────────────────────────────────────────────────────
    pub candles: Arc<CandleSeries>,
    pub live_price: RwLock<Option<LivePrice>>,

    // ── Analysis ────────────────────────────────────────────────────────
    engine: ConfluenceEngine,
    evaluation_guard: Mutex<()>,
    pub latest: RwLock<Evaluation>,
    pub tracked_setup: RwLock<Option<TrackedSetup>>,

    // ── Decision Audit Trail ────────────────────────────────────────────
    pub recent_decisions: RwLock<Vec<DecisionEnvelope>>,

    // ── Timing ──────────────────────────────────────────────────────────
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct a new `AppState` with the swing-based probes configured in
    /// `config.structure`.  The candle history starts empty.
    pub fn new(config: RuntimeConfig) -> Self {
        let engine = ConfluenceEngine::with_params(&config.structure);
        Self::with_engine(config, engine)
    }

    pub fn with_engine(config: RuntimeConfig, engine: ConfluenceEngine) -> Self {
        let candles = Arc::new(CandleSeries::new(config.max_candles));
        let initial = engine.evaluate(&[], &config.settings);

        Self {
            state_version: AtomicU64::new(1),
            ws_sequence_number: AtomicU64::new(0),
            runtime_config: Arc::new(RwLock::new(config)),
            candles,
            live_price: RwLock::new(None),
            engine,
            evaluation_guard: Mutex::new(()),
            latest: RwLock::new(initial),
            tracked_setup: RwLock::new(None),
            recent_decisions: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Decision Audit ──────────────────────────────────────────────────

    /// Record a decision envelope, evicting the oldest beyond
    /// [`MAX_RECENT_DECISIONS`].
    pub fn push_decision(&self, envelope: DecisionEnvelope) {
        let mut decisions = self.recent_decisions.write();
        decisions.push(envelope);
        while decisions.len() > MAX_RECENT_DECISIONS {
            decisions.remove(0);
        }
    }

    // ── Evaluation ──────────────────────────────────────────────────────

    /// Run the engine over the current candles and settings and publish the
    /// result.
    pub fn reevaluate(&self) -> Evaluation {
        let _guard = self.evaluation_guard.lock();
        let candles = self.candles.snapshot();
        let (asset, settings) = {
            let config = self.runtime_config.read();
            (config.asset.clone(), config.settings.clone())
        };

        let mut evaluation = self.engine.evaluate(&candles, &settings);
        self.follow_setup(&mut evaluation, &settings);

        let changed = {
            let previous = self.latest.read();
            previous.snapshot.confluence.signal != evaluation.snapshot.confluence.signal
                || previous.verdict.gate_name() != evaluation.verdict.gate_name()
        };
        if changed {
            let state = &evaluation.snapshot.confluence;
            if state.signal != SignalType::None {
                info!(
                    asset = %asset,
                    signal = %state.signal,
                    score = state.score,
                    entry = ?state.entry,
                    sl = ?state.sl,
                    tp2 = ?state.tp2,
                    "signal published"
                );
            } else {
                debug!(asset = %asset, verdict = %evaluation.verdict, "signal withdrawn");
            }
            self.push_decision(DecisionEnvelope::from_evaluation(&asset, &evaluation));
        }

        *self.latest.write() = evaluation.clone();
        self.increment_version();
        evaluation
    }

    /// Keep the levels of a signal that persists in the same direction and
    /// re-assess breakeven against the latest close.  A new direction (or no
    /// signal) replaces the tracked setup.
    fn follow_setup(&self, evaluation: &mut Evaluation, settings: &TradingSettings) {
        let mut tracked = self.tracked_setup.write();
        let state = &mut evaluation.snapshot.confluence;

        let (Some(direction), Some(fresh)) = (state.direction(), state.levels()) else {
            if tracked.take().is_some() {
                debug!("tracked setup dropped: no signal");
            }
            return;
        };

        match tracked.as_mut() {
            Some(setup) if setup.direction == direction => {
                setup.reassess(fresh.entry, settings.be_threshold);
                *state = std::mem::take(state).with_signal(direction, setup.levels, setup.be_level);
            }
            _ => {
                debug!(direction = %direction, entry = fresh.entry, "tracking new setup");
                *tracked = Some(TrackedSetup {
                    direction,
                    levels: fresh,
                    be_level: state.be_level,
                });
            }
        }
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Replace the candle history with a backfilled batch.
    pub fn backfill(&self, batch: Vec<Candle>) -> Result<Evaluation> {
        if let Some(bad) = batch.iter().find(|c| !c.is_well_formed()) {
            bail!("malformed candle at time {}", bad.time);
        }
        let kept = self.candles.replace_all(batch);
        self.tracked_setup.write().take();
        info!(kept, "candle history backfilled");
        Ok(self.reevaluate())
    }

    /// Append a new bar or replace the live one (same `time`).  Older bars
    /// are rejected.
    pub fn push_candle(&self, candle: Candle) -> Result<Evaluation> {
        if !candle.is_well_formed() {
            bail!("malformed candle at time {}", candle.time);
        }
        if !self.candles.upsert(candle) {
            bail!("candle at time {} is older than the live bar", candle.time);
        }
        Ok(self.reevaluate())
    }

    /// Regenerate the synthetic history from the latest quote (or the
    /// configured base price) and re-evaluate.
    pub fn reseed<R: Rng + ?Sized>(&self, rng: &mut R) -> Evaluation {
        let (count, base_price, timeframe) = {
            let config = self.runtime_config.read();
            (config.candle_count, config.base_price, config.timeframe)
        };
        let base = self
            .live_price
            .read()
            .as_ref()
            .map_or(base_price, |quote| quote.price);

        let batch = generate_candles(rng, count, base, timeframe, Utc::now().timestamp_millis());
        let kept = self.candles.replace_all(batch);
        self.tracked_setup.write().take();
        info!(kept, base, timeframe = %timeframe, "candle history seeded");
        self.reevaluate()
    }

    /// Apply an external quote to the live bar and re-evaluate.
    pub fn apply_price(&self, quote: LivePrice) -> Result<Evaluation> {
        quote.validate()?;
        if self.candles.apply_tick(quote.price).is_none() {
            debug!(price = quote.price, "quote received before any candle history");
        }
        *self.live_price.write() = Some(quote);
        Ok(self.reevaluate())
    }

    /// One live drift tick: pull the last close toward the latest quote.
    /// Returns `None` while there is no history.
    pub fn refresh_tick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Evaluation> {
        let last = self.candles.last()?;
        let target = self.live_price.read().as_ref().map(|quote| quote.price);
        let close = drift_close(rng, last.close, target);
        self.candles.apply_tick(close)?;
        Some(self.reevaluate())
    }

    /// Apply a settings change.  A new asset or timeframe reseeds the
    /// history; anything else re-evaluates against identical candles.
    pub fn apply_settings(&self, update: SettingsUpdate) -> Result<Evaluation> {
        let reseed = {
            let mut config = self.runtime_config.write();
            let settings = update.patch.apply(&config.settings);
            settings.validate()?;

            let asset = match update.asset.as_deref().map(str::trim) {
                Some("") => bail!("asset must not be empty"),
                Some(asset) => asset.to_uppercase(),
                None => config.asset.clone(),
            };
            let timeframe = update.timeframe.unwrap_or(config.timeframe);

            let asset_changed = asset != config.asset;
            let reseed = asset_changed || timeframe != config.timeframe;
            if asset_changed {
                self.live_price.write().take();
            }

            info!(asset = %asset, timeframe = %timeframe, reseed, "settings updated");
            config.asset = asset;
            config.timeframe = timeframe;
            config.settings = settings;
            reseed
        };

        self.tracked_setup.write().take();
        if reseed {
            Ok(self.reseed(&mut rand::thread_rng()))
        } else {
            Ok(self.reevaluate())
        }
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// The latest engine output only.
    pub fn analysis(&self) -> IndicatorSnapshot {
        self.latest.read().snapshot.clone()
    }

    /// Build a complete, serialisable snapshot of the service state.
    ///
    /// This is the payload of `GET /api/v1/state` and the WebSocket feed.
    pub fn build_snapshot(&self) -> StateSnapshot {
        let now = Utc::now();
        let config = self.runtime_config.read();
        let latest = self.latest.read().clone();

        StateSnapshot {
            state_version: self.current_state_version(),
            server_time: now.timestamp_millis(),
            uptime_s: self.start_time.elapsed().as_secs(),
            asset: config.asset.clone(),
            timeframe: config.timeframe,
            settings: config.settings.clone(),
            live_price: self.live_price.read().clone(),
            last_candle: self.candles.last(),
            candle_count: self.candles.len(),
            analysis: latest.snapshot,
            verdict: latest.verdict,
            tracked_setup: *self.tracked_setup.read(),
            recent_decisions: self.recent_decisions.read().clone(),
        }
    }
}

// =============================================================================
// Serialisable snapshot
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub uptime_s: u64,
    pub asset: String,
    pub timeframe: Timeframe,
    pub settings: TradingSettings,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_price: Option<LivePrice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_candle: Option<Candle>,

    pub candle_count: usize,
    pub analysis: IndicatorSnapshot,
    pub verdict: GateVerdict,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracked_setup: Option<TrackedSetup>,

    pub recent_decisions: Vec<DecisionEnvelope>,
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::StructureProbes;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bar(time: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(time, open, high, low, close, 100)
    }

    /// Last five closes run 2490 -> 2510; the last bar spans 2502..2513.
    fn rising() -> Vec<Candle> {
        let mut candles: Vec<Candle> =
            (0..6).map(|i| bar(i, 2480.0, 2482.0, 2479.0, 2481.0)).collect();
        candles.push(bar(6, 2484.0, 2493.0, 2481.0, 2490.0));
        let mut close = 2490.0;
        for t in 7..11 {
            let open = close;
            close += 5.0;
            candles.push(bar(t, open, close + 3.0, open - 3.0, close));
        }
        candles
    }

    /// Liquidity always present, no zone requirements: every evaluation with
    /// enough history signals in the momentum direction.
    fn always_signalling() -> AppState {
        let mut config = RuntimeConfig::default();
        config.settings = TradingSettings {
            require_ob: false,
            require_fvg: false,
            min_confluence: 1,
            ..Default::default()
        };
        AppState::with_engine(config, ConfluenceEngine::new(StructureProbes::fixed(true, false)))
    }

    #[test]
    fn starts_empty_and_degenerate() {
        let state = AppState::new(RuntimeConfig::default());
        let snapshot = state.build_snapshot();
        assert_eq!(snapshot.candle_count, 0);
        assert_eq!(snapshot.analysis, IndicatorSnapshot::default());
        assert!(matches!(snapshot.verdict, GateVerdict::InsufficientHistory { .. }));
        assert!(state.refresh_tick(&mut StdRng::seed_from_u64(1)).is_none());
    }

    #[test]
    fn reseed_fills_history_and_bumps_version() {
        let state = AppState::new(RuntimeConfig::default());
        let before = state.current_state_version();
        state.reseed(&mut StdRng::seed_from_u64(9));
        assert_eq!(state.candles.len(), 100);
        assert!(state.current_state_version() > before);
        assert_eq!(state.candles.snapshot()[0].open, 2500.0);
    }

    #[test]
    fn price_sync_patches_live_bar() {
        let state = AppState::new(RuntimeConfig::default());
        state.reseed(&mut StdRng::seed_from_u64(2));
        let before = state.candles.last().unwrap();

        state.apply_price(LivePrice::at(before.close + 5.0)).unwrap();
        let after = state.candles.last().unwrap();
        assert_eq!(after.time, before.time);
        assert_eq!(after.close, before.close + 5.0);
        assert_eq!(after.high, before.close + 5.0);
        assert_eq!(state.candles.len(), 100);
        assert!(state.live_price.read().is_some());
    }

    #[test]
    fn invalid_price_is_rejected_without_mutation() {
        let state = AppState::new(RuntimeConfig::default());
        state.reseed(&mut StdRng::seed_from_u64(2));
        let version = state.current_state_version();
        let last = state.candles.last();

        assert!(state.apply_price(LivePrice::at(-1.0)).is_err());
        assert_eq!(state.current_state_version(), version);
        assert_eq!(state.candles.last(), last);
        assert!(state.live_price.read().is_none());
    }

    #[test]
    fn refresh_tick_moves_close_toward_quote() {
        let state = AppState::new(RuntimeConfig::default());
        state.reseed(&mut StdRng::seed_from_u64(4));
        let last = state.candles.last().unwrap().close;
        *state.live_price.write() = Some(LivePrice::at(last + 100.0));

        state.refresh_tick(&mut StdRng::seed_from_u64(5)).unwrap();
        let next = state.candles.last().unwrap().close;
        assert!(next > last + 9.0 && next < last + 11.0, "{last} -> {next}");
    }

    #[test]
    fn settings_change_keeps_history() {
        let state = AppState::new(RuntimeConfig::default());
        state.reseed(&mut StdRng::seed_from_u64(3));
        let history = state.candles.snapshot();

        let update = SettingsUpdate {
            patch: SettingsPatch { min_confluence: Some(4), ..Default::default() },
            ..Default::default()
        };
        state.apply_settings(update).unwrap();
        assert_eq!(state.candles.snapshot(), history);
        assert_eq!(state.runtime_config.read().settings.min_confluence, 4);
    }

    #[test]
    fn invalid_settings_leave_config_untouched() {
        let state = AppState::new(RuntimeConfig::default());
        let update = SettingsUpdate {
            timeframe: Some(Timeframe::H4),
            patch: SettingsPatch { be_threshold: Some(2.0), ..Default::default() },
            ..Default::default()
        };
        assert!(state.apply_settings(update).is_err());
        let config = state.runtime_config.read();
        assert_eq!(config.timeframe, Timeframe::M15);
        assert_eq!(config.settings, TradingSettings::default());
    }

    #[test]
    fn timeframe_change_reseeds() {
        let state = AppState::new(RuntimeConfig::default());
        state.reseed(&mut StdRng::seed_from_u64(3));

        let update = SettingsUpdate {
            timeframe: Some(Timeframe::H1),
            ..Default::default()
        };
        state.apply_settings(update).unwrap();
        let candles = state.candles.snapshot();
        assert_eq!(candles.len(), 100);
        assert_eq!(candles[1].time - candles[0].time, Timeframe::H1.interval_ms());
    }

    #[test]
    fn asset_change_clears_quote() {
        let state = AppState::new(RuntimeConfig::default());
        state.reseed(&mut StdRng::seed_from_u64(3));
        state.apply_price(LivePrice::at(2600.0)).unwrap();

        let update = SettingsUpdate {
            asset: Some("eurusd".into()),
            ..Default::default()
        };
        state.apply_settings(update).unwrap();
        assert_eq!(state.runtime_config.read().asset, "EURUSD");
        assert!(state.live_price.read().is_none());
        assert_eq!(state.candles.snapshot()[0].open, 2500.0);
    }

    #[test]
    fn backfill_rejects_malformed_batch() {
        let state = AppState::new(RuntimeConfig::default());
        let batch = vec![bar(0, 10.0, 9.0, 8.0, 9.5)];
        assert!(state.backfill(batch).is_err());
        assert!(state.candles.is_empty());
    }

    #[test]
    fn push_candle_appends_or_replaces() {
        let state = AppState::new(RuntimeConfig::default());
        state.backfill(rising()).unwrap();

        state.push_candle(bar(11, 2510.0, 2516.0, 2508.0, 2514.0)).unwrap();
        assert_eq!(state.candles.len(), 12);
        state.push_candle(bar(11, 2510.0, 2518.0, 2508.0, 2517.0)).unwrap();
        assert_eq!(state.candles.len(), 12);
        assert_eq!(state.candles.last().unwrap().close, 2517.0);

        assert!(state.push_candle(bar(3, 1.0, 2.0, 0.5, 1.5)).is_err());
        assert!(state.push_candle(bar(12, 10.0, 9.0, 8.0, 9.5)).is_err());
        assert_eq!(state.candles.len(), 12);
    }

    #[test]
    fn signal_is_recorded_once() {
        let state = always_signalling();
        let eval = state.backfill(rising()).unwrap();
        assert_eq!(eval.snapshot.confluence.signal, SignalType::Buy);
        assert_eq!(eval.snapshot.confluence.entry, Some(2510.0));

        // Same outcome again: no new decision.
        state.reevaluate();
        let decisions = state.recent_decisions.read();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].final_decision, "SIGNAL");
    }

    #[test]
    fn tracked_setup_promotes_and_latches_breakeven() {
        let state = always_signalling();
        state.backfill(rising()).unwrap();
        let setup = state.tracked_setup.read().expect("setup tracked");
        // Risk 11 * 1.1 = 12.1, TP1 = 2510 + 12.1 * 2.5 * 0.5 = 2525.125.
        assert!((setup.levels.tp1 - 2525.125).abs() < 1e-9);
        assert!(setup.be_level.is_none());

        // Move of 8 >= 0.5 * 15.125.
        let eval = state.apply_price(LivePrice::at(2518.0)).unwrap();
        let published = &eval.snapshot.confluence;
        assert_eq!(published.signal, SignalType::Buy);
        assert_eq!(published.entry, Some(2510.0));
        assert!(published.is_be_triggered);
        assert_eq!(published.be_level, Some(2510.0));

        // Pulling back does not undo the promotion.
        let eval = state.apply_price(LivePrice::at(2511.0)).unwrap();
        assert!(eval.snapshot.confluence.is_be_triggered);
        assert_eq!(eval.snapshot.confluence.entry, Some(2510.0));
    }

    #[test]
    fn direction_change_replaces_setup() {
        let state = always_signalling();
        state.backfill(rising()).unwrap();

        let eval = state.apply_price(LivePrice::at(2400.0)).unwrap();
        let published = &eval.snapshot.confluence;
        assert_eq!(published.signal, SignalType::Sell);
        assert_eq!(published.entry, Some(2400.0));
        let setup = state.tracked_setup.read().expect("new setup tracked");
        assert_eq!(setup.direction, Direction::Bearish);
        assert!(!published.is_be_triggered);
    }

    #[test]
    fn snapshot_serialises() {
        let state = always_signalling();
        state.backfill(rising()).unwrap();
        let json = serde_json::to_value(state.build_snapshot()).unwrap();
        assert_eq!(json["asset"], "XAUUSD");
        assert_eq!(json["timeframe"], "15M");
        assert_eq!(json["analysis"]["confluence"]["signal"], "BUY");
        assert_eq!(json["verdict"]["gate"], "pass");
        assert_eq!(json["candle_count"], 11);
    }

    #[test]
    fn concurrent_quotes_publish_the_final_candles() {
        let state = always_signalling();
        state.backfill(rising()).unwrap();
        let before = state.current_state_version();

        std::thread::scope(|scope| {
            for offset in [-40.0, 40.0] {
                let state = &state;
                scope.spawn(move || {
                    for step in 0..200 {
                        let price = 2510.0 + offset * f64::from(step % 7) / 6.0;
                        state.apply_price(LivePrice::at(price)).unwrap();
                    }
                });
            }
        });

        assert_eq!(state.current_state_version(), before + 400);

        let settings = state.runtime_config.read().settings.clone();
        let fresh = state.engine.evaluate(&state.candles.snapshot(), &settings);
        let latest = state.latest.read().clone();
        assert_eq!(latest.verdict, fresh.verdict);
        assert_eq!(latest.snapshot.fvgs, fresh.snapshot.fvgs);
        assert_eq!(latest.snapshot.order_blocks, fresh.snapshot.order_blocks);
        assert_eq!(latest.snapshot.confluence.signal, fresh.snapshot.confluence.signal);
        assert_eq!(latest.snapshot.confluence.score, fresh.snapshot.confluence.score);

        let setup = state.tracked_setup.read().expect("signal still tracked");
        assert_eq!(Some(setup.direction), fresh.snapshot.confluence.direction());
    }
}
