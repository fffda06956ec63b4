use crate::infra::{AppState, PricingState, ValidJson};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use rate_card::acquisition::{refresh_in_background, LoadedTable};
use rate_card::error::AppError;
use rate_card::pricing::{
    format_currency, format_percentage, format_rate_or_na, format_whole_percentage, Calculation,
    CalculationRequest, EvaluationResult, LocationMap, PortfolioSummary, Position, PricingMode,
    QuoteResult, RoleRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Serialize)]
pub(crate) struct RolesResponse {
    pub(crate) source: String,
    pub(crate) loaded_at: DateTime<Utc>,
    pub(crate) roles: Vec<RoleRecord>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RateTableMetadata {
    pub(crate) source: String,
    pub(crate) loaded_at: DateTime<Utc>,
    pub(crate) roles: usize,
}

impl From<&LoadedTable> for RateTableMetadata {
    fn from(loaded: &LoadedTable) -> Self {
        Self {
            source: loaded.source.clone(),
            loaded_at: loaded.loaded_at,
            roles: loaded.table.len(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CalculateRequest {
    #[serde(default)]
    pub(crate) mode: Option<PricingMode>,
    #[serde(flatten)]
    pub(crate) input: CalculationRequest,
}

#[derive(Debug, Serialize)]
pub(crate) struct CalculateResponse {
    pub(crate) calculation: Calculation,
    pub(crate) formatted: FormattedFigures,
}

/// Display strings for a calculation. `margin` is the desired margin for a
/// quote and the achieved margin for an evaluation.
#[derive(Debug, Serialize)]
pub(crate) struct FormattedFigures {
    pub(crate) cost: String,
    pub(crate) client_rate: String,
    pub(crate) margin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) target_margin: Option<String>,
    pub(crate) total_cost: String,
    pub(crate) comparison: LocationMap<FormattedLocation>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct FormattedLocation {
    pub(crate) cost: String,
    pub(crate) client_rate: String,
    pub(crate) margin: String,
}

impl From<&QuoteResult> for FormattedFigures {
    fn from(result: &QuoteResult) -> Self {
        Self {
            cost: format_rate_or_na(result.cost),
            client_rate: format_currency(result.client_rate),
            margin: format_percentage(result.desired_margin),
            target_margin: None,
            total_cost: format_currency(result.total_cost),
            comparison: result.comparison.map(|_, entry| FormattedLocation {
                cost: format_rate_or_na(entry.cost),
                client_rate: format_rate_or_na(entry.client_rate),
                margin: entry
                    .achieved_margin
                    .map(format_percentage)
                    .unwrap_or_else(|| "N/A".to_string()),
            }),
        }
    }
}

impl From<&EvaluationResult> for FormattedFigures {
    fn from(result: &EvaluationResult) -> Self {
        let rate = format_currency(result.client_rate);
        Self {
            cost: format_rate_or_na(result.cost),
            client_rate: rate.clone(),
            margin: format_percentage(result.margin),
            target_margin: Some(format_whole_percentage(result.target_margin)),
            total_cost: format_currency(result.total_cost),
            comparison: result.comparison.map(|_, entry| FormattedLocation {
                cost: format_rate_or_na(entry.cost),
                client_rate: rate.clone(),
                margin: if entry.cost > 0.0 {
                    format_percentage(entry.margin)
                } else {
                    "N/A".to_string()
                },
            }),
        }
    }
}

impl From<&Calculation> for FormattedFigures {
    fn from(calculation: &Calculation) -> Self {
        match calculation {
            Calculation::Quote(result) => result.into(),
            Calculation::Evaluation(result) => result.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PositionsResponse {
    pub(crate) positions: Vec<Position>,
    pub(crate) summary: PortfolioSummary,
}

pub(crate) fn with_pricing_routes(state: Arc<PricingState>) -> Router {
    pricing_router(state)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

fn pricing_router(state: Arc<PricingState>) -> Router {
    Router::new()
        .route("/api/v1/roles", get(roles_endpoint))
        .route("/api/v1/rate-table/refresh", post(refresh_endpoint))
        .route("/api/v1/calculate", post(calculate_endpoint))
        .route(
            "/api/v1/positions",
            post(add_position_endpoint)
                .get(list_positions_endpoint)
                .delete(clear_positions_endpoint),
        )
        .route("/api/v1/positions/summary", get(summary_endpoint))
        .route("/api/v1/positions/:id", delete(delete_position_endpoint))
        .with_state(state)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn roles_endpoint(State(state): State<Arc<PricingState>>) -> Json<RolesResponse> {
    let snapshot = state.store.snapshot();
    Json(RolesResponse {
        source: snapshot.source.clone(),
        loaded_at: snapshot.loaded_at,
        roles: snapshot.table.records().to_vec(),
    })
}

pub(crate) async fn refresh_endpoint(
    State(state): State<Arc<PricingState>>,
) -> Result<Json<RateTableMetadata>, AppError> {
    let loaded = refresh_in_background(state.store.clone(), state.chain.clone()).await?;
    info!(source = %loaded.source, roles = loaded.table.len(), "rate table refreshed on request");
    Ok(Json(RateTableMetadata::from(loaded.as_ref())))
}

pub(crate) async fn calculate_endpoint(
    State(state): State<Arc<PricingState>>,
    ValidJson(payload): ValidJson<CalculateRequest>,
) -> Result<Json<CalculateResponse>, AppError> {
    let input = payload.input.validate()?;
    let mode = payload.mode.unwrap_or(state.mode);
    let snapshot = state.store.snapshot();
    let calculation = mode.calculate(&snapshot.table, &input)?;
    let formatted = FormattedFigures::from(&calculation);

    Ok(Json(CalculateResponse {
        calculation,
        formatted,
    }))
}

pub(crate) async fn add_position_endpoint(
    State(state): State<Arc<PricingState>>,
    ValidJson(payload): ValidJson<CalculationRequest>,
) -> Result<(StatusCode, Json<Position>), AppError> {
    let input = payload.validate()?;
    let snapshot = state.store.snapshot();
    let position = state.positions().add(&snapshot.table, &input)?.clone();
    info!(id = position.id, role = %position.quote.role, "position added");
    Ok((StatusCode::CREATED, Json(position)))
}

pub(crate) async fn list_positions_endpoint(
    State(state): State<Arc<PricingState>>,
) -> Json<PositionsResponse> {
    let book = state.positions();
    Json(PositionsResponse {
        positions: book.positions().to_vec(),
        summary: book.summary(),
    })
}

pub(crate) async fn summary_endpoint(
    State(state): State<Arc<PricingState>>,
) -> Json<PortfolioSummary> {
    Json(state.positions().summary())
}

pub(crate) async fn delete_position_endpoint(
    State(state): State<Arc<PricingState>>,
    Path(id): Path<u64>,
) -> Result<Json<Position>, AppError> {
    let removed = state
        .positions()
        .remove(id)
        .ok_or(AppError::PositionNotFound(id))?;
    info!(id, "position removed");
    Ok(Json(removed))
}

pub(crate) async fn clear_positions_endpoint(
    State(state): State<Arc<PricingState>>,
) -> Json<serde_json::Value> {
    let cleared = state.positions().clear();
    info!(cleared, "positions cleared");
    Json(json!({ "cleared": cleared }))
}
