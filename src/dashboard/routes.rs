//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`.
//! Views read the most recent session; `POST /api/run` replaces it.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::config::{check_params, DAILY_SPEND_RANGE, HORIZON_DAYS_RANGE, TRADE_THRESHOLD_RANGE};
use crate::data::sector::Sector;
use crate::engine::report::{SeriesPoint, SessionReport, SessionSummary, YieldCurvePoint};
use crate::engine::session::SessionEngine;
use crate::simulator::SimulationParams;
use crate::types::{DailySummaryRow, TradeLogEntry, VolatilitySource};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub engine: SessionEngine,
    pub defaults: SimulationParams,
    pub last_report: RwLock<Option<SessionReport>>,
}

impl DashboardState {
    pub fn new(engine: SessionEngine, defaults: SimulationParams) -> Self {
        Self {
            engine,
            defaults,
            last_report: RwLock::new(None),
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Parameter panel submission. Missing fields take the configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunRequest {
    pub horizon_days: Option<usize>,
    pub daily_spend: Option<f64>,
    pub trade_threshold: Option<f64>,
}

impl RunRequest {
    fn resolve(&self, defaults: &SimulationParams) -> SimulationParams {
        SimulationParams {
            horizon_days: self.horizon_days.unwrap_or(defaults.horizon_days),
            daily_spend: self.daily_spend.unwrap_or(defaults.daily_spend),
            trade_threshold: self.trade_threshold.unwrap_or(defaults.trade_threshold),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    pub params: SimulationParams,
    pub sector: Option<Sector>,
    pub ticker: String,
    pub volatility_source: VolatilitySource,
    pub summary: SessionSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamsResponse {
    pub defaults: SimulationParams,
    pub horizon_days: Bounds<usize>,
    pub daily_spend: Bounds<f64>,
    pub trade_threshold: Bounds<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub params: SimulationParams,
    pub started_at: String,
    pub yield_feed: String,
    pub sector: Option<Sector>,
    pub ticker: String,
    pub volatility_source: VolatilitySource,
    pub summary: SessionSummary,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Error returned by handlers as `{ "error": ... }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// POST /api/run
pub async fn run_session(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    let params = req.resolve(&state.defaults);
    check_params(&params).map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;

    let report = state.engine.run(&params).await.map_err(|e| {
        error!(error = %e, "Session run failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
    })?;

    info!(
        horizon_days = params.horizon_days,
        signals = report.summary.trade_signals,
        "Dashboard session stored"
    );

    let resp = RunResponse {
        params: report.params.clone(),
        sector: report.sector,
        ticker: report.ticker.clone(),
        volatility_source: report.volatility_source.clone(),
        summary: report.summary.clone(),
    };
    *state.last_report.write().await = Some(report);
    Ok(Json(resp))
}

/// GET /api/params
pub async fn get_params(State(state): State<AppState>) -> Json<ParamsResponse> {
    Json(ParamsResponse {
        defaults: state.defaults.clone(),
        horizon_days: Bounds {
            min: *HORIZON_DAYS_RANGE.start(),
            max: *HORIZON_DAYS_RANGE.end(),
        },
        daily_spend: Bounds {
            min: *DAILY_SPEND_RANGE.start(),
            max: *DAILY_SPEND_RANGE.end(),
        },
        trade_threshold: Bounds {
            min: *TRADE_THRESHOLD_RANGE.start(),
            max: *TRADE_THRESHOLD_RANGE.end(),
        },
    })
}

/// GET /api/summary
pub async fn get_summary(State(state): State<AppState>) -> Result<Json<SummaryResponse>, ApiError> {
    let report = state.last_report.read().await;
    let report = report
        .as_ref()
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "no session has been run yet"))?;
    Ok(Json(SummaryResponse {
        params: report.params.clone(),
        started_at: report.started_at.to_rfc3339(),
        yield_feed: report.yield_feed.clone(),
        sector: report.sector,
        ticker: report.ticker.clone(),
        volatility_source: report.volatility_source.clone(),
        summary: report.summary.clone(),
    }))
}

/// GET /api/profit
pub async fn get_profit(State(state): State<AppState>) -> Json<Vec<SeriesPoint>> {
    let report = state.last_report.read().await;
    Json(report.as_ref().map(SessionReport::cumulative_profit_series).unwrap_or_default())
}

/// GET /api/option-income
pub async fn get_option_income(State(state): State<AppState>) -> Json<Vec<SeriesPoint>> {
    let report = state.last_report.read().await;
    Json(report.as_ref().map(SessionReport::option_income_series).unwrap_or_default())
}

/// GET /api/yields
pub async fn get_yields(State(state): State<AppState>) -> Json<Vec<YieldCurvePoint>> {
    let report = state.last_report.read().await;
    Json(report.as_ref().map(SessionReport::yield_curve_series).unwrap_or_default())
}

/// GET /api/daily
pub async fn get_daily(State(state): State<AppState>) -> Json<Vec<DailySummaryRow>> {
    let report = state.last_report.read().await;
    Json(report.as_ref().map(SessionReport::summary_rows).unwrap_or_default())
}

/// GET /api/trades
pub async fn get_trades(State(state): State<AppState>) -> Json<Vec<TradeLogEntry>> {
    let report = state.last_report.read().await;
    Json(report.as_ref().map(|r| r.trade_log.clone()).unwrap_or_default())
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
