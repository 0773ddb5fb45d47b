// =============================================================================
// Confluence Engine - Main Entry Point
// =============================================================================
//
// Seeds a synthetic candle history, starts the live drift tick and serves
// the analysis over HTTP + WebSocket until Ctrl+C.  Settings changed through
// the API are persisted to runtime_config.json on shutdown.
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use confluence_engine::api;
use confluence_engine::app_state::AppState;
use confluence_engine::runtime_config::RuntimeConfig;

const CONFIG_PATH: &str = "runtime_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Confluence engine starting up");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        RuntimeConfig::default()
    });

    if let Ok(asset) = std::env::var("CONFLUENCE_ASSET") {
        let asset = asset.trim().to_uppercase();
        if !asset.is_empty() {
            config.asset = asset;
        }
    }
    if let Ok(addr) = std::env::var("CONFLUENCE_BIND_ADDR") {
        config.bind_addr = addr;
    }

    info!(
        asset = %config.asset,
        timeframe = %config.timeframe,
        min_confluence = config.settings.min_confluence,
        "analysis configured"
    );

    // ── 2. Shared state + initial history ────────────────────────────────
    let refresh_ms = config.refresh_interval_ms;
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config));

    let mut rng = StdRng::from_entropy();
    let initial = state.reseed(&mut rng);
    info!(
        score = initial.snapshot.confluence.score,
        signal = %initial.snapshot.confluence.signal,
        verdict = %initial.verdict,
        "initial evaluation"
    );

    // ── 3. Live drift tick ───────────────────────────────────────────────
    if refresh_ms > 0 {
        let tick_state = state.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_millis(refresh_ms));
            interval.tick().await;
            loop {
                interval.tick().await;
                tick_state.refresh_tick(&mut rng);
            }
        });
    } else {
        info!("live drift tick disabled");
    }

    // ── 4. API server ────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    let app = api::rest::router(state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    // ── 5. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("shutdown signal received, stopping");

    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "failed to save runtime config on shutdown");
    }

    info!("confluence engine shut down");
    Ok(())
}
