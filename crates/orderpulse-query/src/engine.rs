//! Query engine abstraction

use async_trait::async_trait;

use crate::types::{JobStatus, ResultPage};
use crate::Result;

/// A remote engine that runs SQL asynchronously.
///
/// Implementations must be safe to share across concurrent requests; the
/// executor holds one as `Arc<dyn QueryEngine>` for the life of the process.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Submit a statement and return the engine's job id
    async fn submit(&self, sql: &str, database: &str, output_location: &str) -> Result<String>;

    /// Read the job's current state
    async fn status(&self, job_id: &str) -> Result<JobStatus>;

    /// Fetch one page of raw result rows.
    ///
    /// `next_token` is `None` for the first page; the returned page carries
    /// the token for the following one, or `None` when it was the last.
    async fn fetch_page(&self, job_id: &str, next_token: Option<&str>) -> Result<ResultPage>;
}
