//! Run-scoped analytics endpoints
//!
//! Each endpoint resolves the latest ETL run, renders its canned statement
//! for that run and returns the decoded rows as a JSON array. All values are
//! strings (or null) exactly as the engine reported them. No run yet means
//! `200 []`; any failure means `500 {"error": "..."}`.

use axum::{extract::State, http::StatusCode, Json};
use orderpulse_query::{AnalyticsQuery, ResultSet};

use super::{internal_error, record_request, HandlerError};
use crate::models::ErrorResponse;
use crate::AppState;

/// Revenue per day for the latest run, ordered by day
#[utoipa::path(
    get,
    path = "/analytics/daily-revenue",
    responses(
        (status = 200, description = "Array of {day, revenue} records; empty when no run exists"),
        (status = 500, description = "Query failed", body = ErrorResponse)
    ),
    tag = "analytics"
)]
pub async fn daily_revenue(State(state): State<AppState>) -> Result<Json<ResultSet>, HandlerError> {
    run_for_latest(&state, AnalyticsQuery::DailyRevenue).await
}

/// Ten best-selling products by units for the latest run
#[utoipa::path(
    get,
    path = "/analytics/top-products",
    responses(
        (status = 200, description = "Array of {productName, units} records; empty when no run exists"),
        (status = 500, description = "Query failed", body = ErrorResponse)
    ),
    tag = "analytics"
)]
pub async fn top_products(State(state): State<AppState>) -> Result<Json<ResultSet>, HandlerError> {
    run_for_latest(&state, AnalyticsQuery::TopProducts).await
}

/// Orders per day for the latest run, ordered by day
#[utoipa::path(
    get,
    path = "/analytics/order-count",
    responses(
        (status = 200, description = "Array of {day, orders} records; empty when no run exists"),
        (status = 500, description = "Query failed", body = ErrorResponse)
    ),
    tag = "analytics"
)]
pub async fn order_count(State(state): State<AppState>) -> Result<Json<ResultSet>, HandlerError> {
    run_for_latest(&state, AnalyticsQuery::OrderCount).await
}

async fn run_for_latest(
    state: &AppState,
    query: AnalyticsQuery,
) -> Result<Json<ResultSet>, HandlerError> {
    let endpoint = query.name();

    let run_id = match state.runs.latest_run().await {
        Ok(Some(run_id)) => run_id,
        Ok(None) => {
            tracing::info!(endpoint, "no ingested run yet, returning empty result");
            record_request(endpoint, StatusCode::OK);
            return Ok(Json(ResultSet::empty()));
        }
        Err(e) => return Err(internal_error(endpoint, e)),
    };

    let sql = query.sql(&state.analytics_table, &run_id);
    let result = state
        .executor
        .execute(&sql)
        .await
        .map_err(|e| internal_error(endpoint, e))?;

    tracing::debug!(endpoint, run_id = %run_id, rows = result.len(), "analytics query served");
    record_request(endpoint, StatusCode::OK);
    Ok(Json(result))
}
