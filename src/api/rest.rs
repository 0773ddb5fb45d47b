// =============================================================================
// REST API Endpoints - Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`.  Reads are public; anything that
// feeds the engine new input (settings, candle backfill, price sync)
// requires the admin Bearer token via the `AuthBearer` extractor.
//
// CORS is configured permissively for the charting front-end.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::api::auth::AuthBearer;
use crate::app_state::{AppState, SettingsUpdate};
use crate::engine::Evaluation;
use crate::market_data::{Candle, LivePrice, Timeframe};
use crate::settings::TradingSettings;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn bad_request(err: anyhow::Error) -> ApiError {
    warn!(error = %err, "request rejected");
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": format!("{err:#}") })),
    )
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/analysis", get(analysis))
        .route("/api/v1/decisions", get(decisions))
        .route("/api/v1/candles", get(candles).post(backfill_candles))
        .route("/api/v1/candles/latest", post(push_candle))
        .route("/api/v1/settings", get(get_settings).post(set_settings))
        .route("/api/v1/price", post(sync_price))
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Reads (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    candle_count: usize,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        candle_count: state.candles.len(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

async fn full_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

async fn analysis(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.analysis())
}

async fn decisions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.recent_decisions.read().clone())
}

#[derive(Deserialize)]
struct CandlesQuery {
    #[serde(default)]
    limit: Option<usize>,
}

async fn candles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CandlesQuery>,
) -> impl IntoResponse {
    let candles = match query.limit {
        Some(limit) => state.candles.recent(limit),
        None => state.candles.snapshot(),
    };
    Json(candles)
}

#[derive(Serialize)]
struct SettingsView {
    asset: String,
    timeframe: Timeframe,
    settings: TradingSettings,
}

fn settings_view(state: &AppState) -> SettingsView {
    let config = state.runtime_config.read();
    SettingsView {
        asset: config.asset.clone(),
        timeframe: config.timeframe,
        settings: config.settings.clone(),
    }
}

async fn get_settings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(settings_view(&state))
}

// =============================================================================
// Engine inputs (authenticated)
// =============================================================================

#[derive(Serialize)]
struct SettingsResponse {
    #[serde(flatten)]
    view: SettingsView,
    evaluation: Evaluation,
}

async fn set_settings(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let evaluation = state.apply_settings(update).map_err(bad_request)?;
    Ok(Json(SettingsResponse {
        view: settings_view(&state),
        evaluation,
    }))
}

#[derive(Serialize)]
struct BackfillResponse {
    candle_count: usize,
    evaluation: Evaluation,
}

async fn backfill_candles(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(batch): Json<Vec<Candle>>,
) -> Result<impl IntoResponse, ApiError> {
    let evaluation = state.backfill(batch).map_err(bad_request)?;
    Ok(Json(BackfillResponse {
        candle_count: state.candles.len(),
        evaluation,
    }))
}

async fn push_candle(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(candle): Json<Candle>,
) -> Result<impl IntoResponse, ApiError> {
    let evaluation = state.push_candle(candle).map_err(bad_request)?;
    Ok(Json(evaluation))
}

async fn sync_price(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(quote): Json<LivePrice>,
) -> Result<impl IntoResponse, ApiError> {
    let evaluation = state.apply_price(quote).map_err(bad_request)?;
    Ok(Json(evaluation))
}
