//! Presigned upload URL endpoint

use axum::{extract::State, http::StatusCode, Json};
use orderpulse_observability::metrics::UPLOAD_URLS_TOTAL;

use super::{internal_error, record_request, HandlerError};
use crate::models::ErrorResponse;
use crate::uploads::UploadTicket;
use crate::AppState;

const ENDPOINT: &str = "upload_url";

/// Issue a presigned URL the browser can `PUT` a CSV file to
#[utoipa::path(
    get,
    path = "/upload-url",
    responses(
        (status = 200, description = "Presigned upload URL", body = UploadTicket),
        (status = 500, description = "Signing failed", body = ErrorResponse)
    ),
    tag = "uploads"
)]
pub async fn get_upload_url(
    State(state): State<AppState>,
) -> Result<Json<UploadTicket>, HandlerError> {
    let ticket = state
        .uploads
        .presign_upload()
        .await
        .map_err(|e| internal_error(ENDPOINT, e))?;

    UPLOAD_URLS_TOTAL.inc();
    record_request(ENDPOINT, StatusCode::OK);
    Ok(Json(ticket))
}
