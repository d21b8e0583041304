//! API request handlers

pub mod analytics;
pub mod health;
pub mod uploads;

use std::fmt::Display;

use axum::{http::StatusCode, Json};
use orderpulse_observability::metrics::HTTP_REQUESTS_TOTAL;

use crate::models::ErrorResponse;

/// Error half of every fallible handler
pub type HandlerError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn record_request(endpoint: &str, status: StatusCode) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[endpoint, status.as_str()])
        .inc();
}

/// Log, count and wrap an error as `500 {"error": "..."}`
pub(crate) fn internal_error(endpoint: &str, err: impl Display) -> HandlerError {
    tracing::error!(endpoint, error = %err, "request failed");
    record_request(endpoint, StatusCode::INTERNAL_SERVER_ERROR);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(err.to_string())),
    )
}
