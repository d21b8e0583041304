//! OrderPulse REST API
//!
//! HTTP/JSON API behind the upload page and the analytics dashboard:
//! presigned S3 upload URLs for order CSVs, and Athena-backed analytics
//! scoped to the most recent ETL run.

use std::sync::Arc;

use axum::{routing::get, Router};
use orderpulse_observability::exporter::create_metrics_router;
use orderpulse_query::{LatestRunResolver, QueryExecutor};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod handlers;
pub mod models;
pub mod uploads;

pub use config::{ApiConfig, ConfigError};
pub use uploads::{S3UploadSigner, UploadError, UploadSigner, UploadTicket};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<QueryExecutor>,
    pub runs: Arc<LatestRunResolver>,
    pub uploads: Arc<dyn UploadSigner>,
    /// Cleaned orders table the analytics queries read from
    pub analytics_table: String,
}

impl AppState {
    /// Wire the latest-run resolver to the same executor and table as the analytics queries
    pub fn new(
        executor: Arc<QueryExecutor>,
        uploads: Arc<dyn UploadSigner>,
        analytics_table: impl Into<String>,
    ) -> Self {
        let analytics_table = analytics_table.into();
        let runs = Arc::new(LatestRunResolver::new(
            executor.clone(),
            analytics_table.clone(),
        ));

        Self {
            executor,
            runs,
            uploads,
            analytics_table,
        }
    }
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let swagger = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .route("/running-check", get(handlers::health::running_check))
        .route("/health", get(handlers::health::health_check))
        .route("/live", get(handlers::health::liveness_check))
        .route("/upload-url", get(handlers::uploads::get_upload_url))
        .route(
            "/analytics/daily-revenue",
            get(handlers::analytics::daily_revenue),
        )
        .route(
            "/analytics/top-products",
            get(handlers::analytics::top_products),
        )
        .route(
            "/analytics/order-count",
            get(handlers::analytics::order_count),
        )
        .merge(create_metrics_router())
        .merge(swagger)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the API server
pub async fn serve(router: Router, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("REST API server listening on {}", addr);
    tracing::info!("   Swagger UI: http://localhost:{}/swagger-ui", port);
    tracing::info!("   Health: http://localhost:{}/health", port);

    axum::serve(listener, router).await?;
    Ok(())
}

/// OpenAPI specification
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::running_check,
        handlers::health::health_check,
        handlers::health::liveness_check,
        handlers::uploads::get_upload_url,
        handlers::analytics::daily_revenue,
        handlers::analytics::top_products,
        handlers::analytics::order_count,
    ),
    components(schemas(
        models::HealthResponse,
        models::ErrorResponse,
        uploads::UploadTicket,
    )),
    tags(
        (name = "health", description = "Health checks"),
        (name = "uploads", description = "Presigned CSV uploads"),
        (name = "analytics", description = "Order analytics for the latest ETL run"),
    ),
    info(
        title = "OrderPulse API",
        version = "0.1.0",
        description = "REST API for OrderPulse - order CSV ingestion and Athena analytics"
    )
)]
struct ApiDoc;
