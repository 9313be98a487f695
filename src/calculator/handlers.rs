use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::{
    auth::extractors::{AuthUser, CurrentUser, MaybeAuthUser},
    calculator::{
        dto::{
            AppliedFilters, BinaryOperands, CalculationResponse, ClearedHistoryResponse,
            HistoryParams, HistoryResponse, Pagination, StatsResponse, UnaryOperand,
        },
        engine::{self, parse_operand, Operation},
        repo::{Calculation, NewCalculation, UserStats},
    },
    error::ApiError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/calculator/add", post(add))
        .route("/calculator/subtract", post(subtract))
        .route("/calculator/multiply", post(multiply))
        .route("/calculator/divide", post(divide))
        .route("/calculator/power", post(power))
        .route("/calculator/sqrt", post(sqrt))
        .route("/calculator/history", get(get_history).delete(clear_history))
        .route("/calculator/stats", get(get_stats))
}

/// Client metadata recorded alongside authenticated calculations.
struct RequestMeta {
    user_agent: Option<String>,
    client_ip: Option<String>,
}

impl RequestMeta {
    fn from_headers(headers: &HeaderMap) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        // First hop of X-Forwarded-For; the service runs behind a proxy.
        let client_ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self {
            user_agent,
            client_ip,
        }
    }
}

/// Write the history row for authenticated callers and build the response.
/// A domain failure never reaches this point, so nothing is recorded for it.
async fn finish(
    state: &AppState,
    user: Option<CurrentUser>,
    headers: &HeaderMap,
    operation: Operation,
    operands: serde_json::Value,
    result: f64,
) -> Result<Json<CalculationResponse>, ApiError> {
    let mut calculation_id = None;
    if let Some(user) = user {
        let meta = RequestMeta::from_headers(headers);
        let row = Calculation::record(
            &state.db,
            NewCalculation {
                user_id: user.id,
                operation,
                operands: operands.clone(),
                result,
                user_agent: meta.user_agent.as_deref(),
                client_ip: meta.client_ip.as_deref(),
            },
        )
        .await?;
        debug!(user_id = %user.id, %operation, calculation_id = %row.id, "calculation recorded");
        calculation_id = Some(row.id);
    }

    Ok(Json(CalculationResponse {
        success: true,
        operation,
        operands,
        result,
        saved_to_history: calculation_id.is_some(),
        calculation_id,
    }))
}

fn parse_pair(payload: &BinaryOperands) -> Result<(f64, f64), ApiError> {
    Ok((parse_operand("a", &payload.a)?, parse_operand("b", &payload.b)?))
}

#[instrument(skip(state, user, headers, payload))]
pub async fn add(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    headers: HeaderMap,
    Json(payload): Json<BinaryOperands>,
) -> Result<Json<CalculationResponse>, ApiError> {
    let (a, b) = parse_pair(&payload)?;
    let result = engine::add(a, b);
    finish(&state, user, &headers, Operation::Addition, json!({"a": a, "b": b}), result).await
}

#[instrument(skip(state, user, headers, payload))]
pub async fn subtract(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    headers: HeaderMap,
    Json(payload): Json<BinaryOperands>,
) -> Result<Json<CalculationResponse>, ApiError> {
    let (a, b) = parse_pair(&payload)?;
    let result = engine::subtract(a, b);
    finish(&state, user, &headers, Operation::Subtraction, json!({"a": a, "b": b}), result).await
}

#[instrument(skip(state, user, headers, payload))]
pub async fn multiply(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    headers: HeaderMap,
    Json(payload): Json<BinaryOperands>,
) -> Result<Json<CalculationResponse>, ApiError> {
    let (a, b) = parse_pair(&payload)?;
    let result = engine::multiply(a, b);
    finish(&state, user, &headers, Operation::Multiplication, json!({"a": a, "b": b}), result).await
}

#[instrument(skip(state, user, headers, payload))]
pub async fn divide(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    headers: HeaderMap,
    Json(payload): Json<BinaryOperands>,
) -> Result<Json<CalculationResponse>, ApiError> {
    let (a, b) = parse_pair(&payload)?;
    let result = engine::divide(a, b)?;
    finish(&state, user, &headers, Operation::Division, json!({"a": a, "b": b}), result).await
}

#[instrument(skip(state, user, headers, payload))]
pub async fn power(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    headers: HeaderMap,
    Json(payload): Json<BinaryOperands>,
) -> Result<Json<CalculationResponse>, ApiError> {
    let (a, b) = parse_pair(&payload)?;
    let result = engine::power(a, b)?;
    finish(&state, user, &headers, Operation::Exponentiation, json!({"a": a, "b": b}), result).await
}

#[instrument(skip(state, user, headers, payload))]
pub async fn sqrt(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    headers: HeaderMap,
    Json(payload): Json<UnaryOperand>,
) -> Result<Json<CalculationResponse>, ApiError> {
    let a = parse_operand("a", &payload.a)?;
    let result = engine::sqrt(a)?;
    finish(&state, user, &headers, Operation::SquareRoot, json!({"a": a}), result).await
}

#[instrument(skip(state, params))]
pub async fn get_history(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let filter = params.normalized();
    let page = Calculation::history(&state.db, current.id, &filter).await?;

    Ok(Json(HistoryResponse {
        success: true,
        pagination: Pagination {
            total: page.total,
            limit: filter.limit,
            offset: filter.offset,
            has_more: page.has_more(&filter),
        },
        filters: AppliedFilters {
            operation: filter.operation,
            start_date: filter.start_date,
            end_date: filter.end_date,
        },
        data: page.entries,
    }))
}

#[instrument(skip(state))]
pub async fn clear_history(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Json<ClearedHistoryResponse>, ApiError> {
    let deleted_count = Calculation::clear(&state.db, current.id).await?;
    info!(user_id = %current.id, deleted_count, "calculation history cleared");

    Ok(Json(ClearedHistoryResponse {
        success: true,
        message: "Calculation history cleared successfully",
        deleted_count,
    }))
}

#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Json<StatsResponse<UserStats>>, ApiError> {
    let stats = Calculation::stats(&state.db, current.id).await?;
    Ok(Json(StatsResponse {
        success: true,
        data: stats,
    }))
}
