//! Latest ETL run resolution

use std::sync::Arc;

use tracing::{debug, warn};

use crate::executor::QueryExecutor;
use crate::Result;

/// Cleaned dataset that every ETL run writes into
pub const DEFAULT_RUNS_TABLE: &str = "ecom.orders_cleaned";

/// Column tagging each row with the run that produced it
pub const RUN_ID_COLUMN: &str = "runId";

/// Finds the most recent run id in the cleaned dataset.
///
/// "Most recent" is the greatest run id in the engine's own ordering.
pub struct LatestRunResolver {
    executor: Arc<QueryExecutor>,
    table: String,
}

impl LatestRunResolver {
    pub fn new(executor: Arc<QueryExecutor>, table: impl Into<String>) -> Self {
        Self {
            executor,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The statement used to look up the latest run
    pub fn query(&self) -> String {
        format!(
            "SELECT {col}\nFROM {table}\nWHERE {col} IS NOT NULL\nORDER BY {col} DESC\nLIMIT 1",
            col = RUN_ID_COLUMN,
            table = self.table
        )
    }

    /// Latest run id, or `None` when nothing has been ingested yet.
    ///
    /// Executor errors propagate unchanged.
    pub async fn latest_run(&self) -> Result<Option<String>> {
        let result = self.executor.execute(&self.query()).await?;

        let Some(record) = result.first() else {
            debug!(table = %self.table, "no runs ingested yet");
            return Ok(None);
        };

        // The engine may fold unquoted identifiers to lower case.
        match record.get_ignore_ascii_case(RUN_ID_COLUMN).flatten() {
            Some(run_id) => Ok(Some(run_id.to_string())),
            None => {
                warn!(
                    table = %self.table,
                    columns = ?record.columns(),
                    "latest run row has no {} value",
                    RUN_ID_COLUMN
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutionOptions;
    use crate::memory::{raw_row, InMemoryEngine, ScriptedJob};

    fn resolver(engine: Arc<InMemoryEngine>) -> LatestRunResolver {
        let executor = QueryExecutor::new(engine, ExecutionOptions::new("ecom", "s3://bucket/athena/"));
        LatestRunResolver::new(Arc::new(executor), DEFAULT_RUNS_TABLE)
    }

    #[test]
    fn test_query_filters_orders_and_limits() {
        let engine = Arc::new(InMemoryEngine::new());
        let sql = resolver(engine).query();

        assert!(sql.contains("SELECT runId"));
        assert!(sql.contains("FROM ecom.orders_cleaned"));
        assert!(sql.contains("WHERE runId IS NOT NULL"));
        assert!(sql.contains("ORDER BY runId DESC"));
        assert!(sql.contains("LIMIT 1"));
    }

    #[tokio::test]
    async fn test_returns_run_id_from_first_row() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.script(
            "ORDER BY runId DESC",
            ScriptedJob::succeeded(vec![
                raw_row(&[Some("runId")]),
                raw_row(&[Some("20240105-0930")]),
            ]),
        );

        let run = resolver(engine).latest_run().await.unwrap();
        assert_eq!(run.as_deref(), Some("20240105-0930"));
    }

    #[tokio::test]
    async fn test_lowercased_header_still_resolves() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.script(
            "ORDER BY runId DESC",
            ScriptedJob::succeeded(vec![raw_row(&[Some("runid")]), raw_row(&[Some("r-2")])]),
        );

        let run = resolver(engine).latest_run().await.unwrap();
        assert_eq!(run.as_deref(), Some("r-2"));
    }

    #[tokio::test]
    async fn test_no_rows_means_no_run() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.script(
            "ORDER BY runId DESC",
            ScriptedJob::succeeded(vec![raw_row(&[Some("runId")])]),
        );

        assert_eq!(resolver(engine).latest_run().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_null_run_id_is_treated_as_absent() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.script(
            "ORDER BY runId DESC",
            ScriptedJob::succeeded(vec![raw_row(&[Some("runId")]), raw_row(&[None])]),
        );

        assert_eq!(resolver(engine).latest_run().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_engine_failure_propagates() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.script("ORDER BY runId DESC", ScriptedJob::failed("TABLE_NOT_FOUND"));

        let err = resolver(engine).latest_run().await.unwrap_err();
        assert!(err.to_string().contains("TABLE_NOT_FOUND"));
    }
}
