//! Presigned upload URLs for order CSV files
//!
//! The browser uploads straight to S3 with the returned URL; the file lands
//! under `<prefix>orders_<unix seconds>_<6 hex chars>.csv` where the ETL picks
//! it up.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::Method;
use chrono::{DateTime, Utc};
use object_store::path::Path;
use object_store::signer::Signer;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Upload errors
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to sign upload URL: {0}")]
    Signing(#[from] object_store::Error),
}

/// A presigned URL and the key the uploaded object will have
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicket {
    /// Presigned `PUT` URL; send the CSV as the request body
    pub upload_url: String,
    /// Object key inside the bucket
    pub file_key: String,
}

/// Issues presigned upload URLs
#[async_trait]
pub trait UploadSigner: Send + Sync {
    async fn presign_upload(&self) -> Result<UploadTicket, UploadError>;
}

/// [`UploadSigner`] that signs `PUT` requests against an S3 bucket
#[derive(Debug)]
pub struct S3UploadSigner {
    signer: Arc<dyn Signer>,
    prefix: String,
    expires_in: Duration,
}

impl S3UploadSigner {
    pub fn new(signer: Arc<dyn Signer>, prefix: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            signer,
            prefix: prefix.into(),
            expires_in,
        }
    }
}

#[async_trait]
impl UploadSigner for S3UploadSigner {
    async fn presign_upload(&self) -> Result<UploadTicket, UploadError> {
        let file_key = new_file_key(&self.prefix, Utc::now());
        let url = self
            .signer
            .signed_url(Method::PUT, &Path::from(file_key.as_str()), self.expires_in)
            .await?;

        tracing::info!(
            file_key = %file_key,
            expires_in_secs = self.expires_in.as_secs(),
            "issued presigned upload URL"
        );

        Ok(UploadTicket {
            upload_url: url.to_string(),
            file_key,
        })
    }
}

/// Build a unique object key for an upload started at `now`
pub fn new_file_key(prefix: &str, now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}orders_{}_{}.csv", prefix, now.timestamp(), &suffix[..6])
}
