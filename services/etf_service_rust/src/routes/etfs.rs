//! ETF endpoints.
//!
//! # Endpoints
//!
//! - `GET /api/etfs?zone=&sector=&esg=&terMax=` - Filtered, enriched listing
//! - `GET /api/etfs/{ticker}` - Quote, one year of history and ESG score
//! - `GET /api/etfs/{ticker}/performance?period=1y` - Return and volatility
//! - `GET /api/etfs/{ticker}/history?period=3mo` - Chart rows
//! - `POST /api/etfs/compare` - Side-by-side comparison

use axum::extract::{Path, Query, State};
use axum::Json;
use etf_core::analytics::{ChartPoint, LookbackPeriod, PerformanceSummary};
use etf_core::{validate_ticker, Comparison, EnrichedRow, EtfDetails, FilterParams};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Smallest number of tickers a comparison accepts.
const MIN_COMPARE: usize = 2;

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub tickers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EtfsResponse {
    pub etfs: Vec<EnrichedRow>,
}

#[derive(Debug, Serialize)]
pub struct DetailsResponse {
    pub details: EtfDetails,
}

#[derive(Debug, Serialize)]
pub struct PerformanceResponse {
    pub performance: Option<PerformanceSummary>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub ticker: String,
    pub data: Vec<ChartPoint>,
    pub period: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub comparisons: Vec<Comparison>,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/etfs`
pub async fn list_etfs(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Json<EtfsResponse> {
    let listing = state.service.list_etfs(&params).await;
    Json(EtfsResponse {
        etfs: listing.rows.clone(),
    })
}

/// `GET /api/etfs/{ticker}`
pub async fn get_details(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> AppResult<Json<DetailsResponse>> {
    let ticker = checked_ticker(&ticker)?;
    let details = state.service.details(&ticker).await;
    Ok(Json(DetailsResponse { details }))
}

/// `GET /api/etfs/{ticker}/performance`
///
/// `performance` is null when the history is missing or too short.
pub async fn get_performance(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<PerformanceResponse>> {
    let ticker = checked_ticker(&ticker)?;
    let period = LookbackPeriod::parse_or(query.period.as_deref(), LookbackPeriod::OneYear);

    let performance = state.service.performance(&ticker, period).await;
    Ok(Json(PerformanceResponse { performance }))
}

/// `GET /api/etfs/{ticker}/history`
pub async fn get_history(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<HistoryResponse>> {
    let ticker = checked_ticker(&ticker)?;
    let period = LookbackPeriod::parse_or(query.period.as_deref(), LookbackPeriod::ThreeMonths);

    let data = state.service.history(&ticker, period).await;
    if data.is_empty() {
        return Err(AppError::NotFound(format!(
            "No historical data for {}",
            ticker
        )));
    }

    Ok(Json(HistoryResponse {
        count: data.len(),
        ticker,
        data,
        period: period.as_str().to_string(),
    }))
}

/// `POST /api/etfs/compare`
pub async fn compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> AppResult<Json<CompareResponse>> {
    if request.tickers.len() < MIN_COMPARE {
        return Err(AppError::BadRequest(format!(
            "At least {} tickers are required",
            MIN_COMPARE
        )));
    }

    let tickers = request
        .tickers
        .iter()
        .map(|t| checked_ticker(t))
        .collect::<AppResult<Vec<_>>>()?;

    let comparisons = state.service.compare(&tickers).await;
    debug!(
        "Compared {}/{} tickers",
        comparisons.len(),
        tickers.len()
    );

    Ok(Json(CompareResponse { comparisons }))
}

/// Upper-case and validate a path or body ticker.
fn checked_ticker(raw: &str) -> AppResult<String> {
    let ticker = raw.trim().to_uppercase();
    if validate_ticker(&ticker) {
        Ok(ticker)
    } else {
        Err(AppError::BadRequest(format!("Invalid ticker: {}", raw)))
    }
}
