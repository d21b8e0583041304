//! OrderPulse REST API Server Binary
//!
//! # Environment Variables
//!
//! See [`orderpulse_api::config`] for the full list. The essentials:
//!
//! - `BUCKET_NAME`: S3 bucket for uploads and Athena results (required)
//! - `AWS_REGION`: AWS region
//! - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`: credentials (or any other
//!   source in the standard AWS provider chain)
//! - `API_PORT`: HTTP port (default: 5000)
//! - `RUST_LOG`: Log filter (default: info)
//!
//! # Example
//!
//! ```bash
//! export BUCKET_NAME=orders-ingest
//! export AWS_REGION=ap-southeast-2
//! cargo run --bin api
//! ```

use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::signer::Signer;
use orderpulse_api::{create_router, serve, ApiConfig, AppState, S3UploadSigner};
use orderpulse_query::{AthenaEngine, QueryExecutor};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("OrderPulse REST API starting...");

    let config = ApiConfig::from_env()?;

    info!("Configuration:");
    info!("  Bucket: {}", config.bucket);
    info!("  Region: {}", config.region.as_deref().unwrap_or("<provider chain>"));
    info!("  Athena database: {}", config.athena_database);
    info!("  Athena output: {}", config.athena_output);
    info!("  Analytics table: {}", config.analytics_table);
    info!("  Poll interval: {:?}", config.poll_interval);
    match config.max_wait {
        Some(max_wait) => info!("  Query deadline: {:?}", max_wait),
        None => info!("  Query deadline: none"),
    }

    orderpulse_observability::init();

    // Athena client
    let engine = Arc::new(AthenaEngine::from_env(config.region.clone()).await);
    let executor = Arc::new(QueryExecutor::new(engine, config.execution_options()));
    info!("✓ Athena client initialized");

    // S3 signer for uploads
    let mut s3 = AmazonS3Builder::from_env().with_bucket_name(&config.bucket);
    if let Some(region) = &config.region {
        s3 = s3.with_region(region);
    }
    let signer: Arc<dyn Signer> = Arc::new(s3.build()?);
    let uploads = Arc::new(S3UploadSigner::new(
        signer,
        config.upload_prefix.clone(),
        config.upload_url_ttl,
    ));
    info!("✓ Upload signer initialized (bucket: {})", config.bucket);

    let state = AppState::new(executor, uploads, config.analytics_table.clone());
    let router = create_router(state);

    serve(router, config.port).await?;

    Ok(())
}
