//! Health and liveness endpoints

use axum::Json;

use crate::models::HealthResponse;

/// Backend status check used by the upload page
#[utoipa::path(
    get,
    path = "/running-check",
    responses(
        (status = 200, description = "Backend is running", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn running_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Backend is running...".to_string(),
    })
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Liveness probe endpoint
/// Returns 200 OK if the process is running
#[utoipa::path(
    get,
    path = "/live",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
