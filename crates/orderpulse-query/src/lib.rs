//! OrderPulse Query Core
//!
//! Runs analytical SQL against a remote, asynchronous query engine (Amazon
//! Athena in production) and turns the engine's tabular wire format into
//! records keyed by column name.
//!
//! ## Flow
//!
//! ```text
//! LatestRunResolver ──> QueryExecutor ──submit/poll/fetch──> QueryEngine
//!                            │
//!                            └──> decode_rows ──> ResultSet
//! ```
//!
//! - [`QueryEngine`] is the seam to the remote service. [`AthenaEngine`] talks
//!   to Athena; [`memory::InMemoryEngine`] replays scripted jobs for tests.
//! - [`QueryExecutor`] submits a statement, polls at a fixed interval until a
//!   terminal state (bounded by an optional deadline), drains every result
//!   page and decodes.
//! - [`LatestRunResolver`] finds the newest ETL run id so that analytics
//!   queries can be scoped to it.
//!
//! ## Example
//!
//! ```ignore
//! let engine = Arc::new(AthenaEngine::from_env(None).await);
//! let executor = Arc::new(QueryExecutor::new(
//!     engine,
//!     ExecutionOptions::new("ecom", "s3://my-bucket/athena/"),
//! ));
//! let runs = LatestRunResolver::new(executor.clone(), DEFAULT_RUNS_TABLE);
//!
//! if let Some(run_id) = runs.latest_run().await? {
//!     let sql = AnalyticsQuery::DailyRevenue.sql(DEFAULT_RUNS_TABLE, &run_id);
//!     let result = executor.execute(&sql).await?;
//! }
//! ```

mod analytics;
mod athena;
mod decoder;
mod engine;
mod error;
mod executor;
pub mod memory;
mod runs;
mod types;

pub use analytics::{quote_literal, AnalyticsQuery};
pub use athena::{AthenaEngine, ATHENA_MAX_ATTEMPTS};
pub use decoder::decode_rows;
pub use engine::QueryEngine;
pub use error::QueryError;
pub use executor::{ExecutionOptions, QueryExecutor, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL};
pub use runs::{LatestRunResolver, DEFAULT_RUNS_TABLE, RUN_ID_COLUMN};
pub use types::*;

/// Result type for query operations
pub type Result<T> = std::result::Result<T, QueryError>;
