//! Query executor: submit, poll to a terminal state, drain pages, decode

use std::sync::Arc;
use std::time::Duration;

use orderpulse_observability::metrics;
use tokio::time::Instant;
use tracing::{debug, error, info, trace};

use crate::decoder::decode_rows;
use crate::engine::QueryEngine;
use crate::error::QueryError;
use crate::types::{QueryJob, QueryState, RawRow, ResultSet};
use crate::Result;

/// Default sleep between status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default bound on total polling time
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(300);

/// Where and how a statement runs
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Target database
    pub database: String,
    /// Storage URI where the engine writes raw results. Never cleaned up here.
    pub output_location: String,
    /// Sleep between polls, cut short only to land on the deadline. There is no backoff.
    pub poll_interval: Duration,
    /// Give up after this long without a terminal state; `None` polls forever
    pub max_wait: Option<Duration>,
}

impl ExecutionOptions {
    pub fn new(database: impl Into<String>, output_location: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            output_location: output_location.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: Some(DEFAULT_MAX_WAIT),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }
}

/// Runs SQL through a [`QueryEngine`] and decodes the result.
///
/// Each call is independent: the caller's task stays suspended from
/// submission until the job is terminal and every page has been read. A
/// submitted job cannot be aborted through this interface.
pub struct QueryExecutor {
    engine: Arc<dyn QueryEngine>,
    options: ExecutionOptions,
}

impl QueryExecutor {
    pub fn new(engine: Arc<dyn QueryEngine>, options: ExecutionOptions) -> Self {
        Self { engine, options }
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Execute `sql` with the executor's default options
    pub async fn execute(&self, sql: &str) -> Result<ResultSet> {
        self.execute_with(sql, &self.options).await
    }

    /// Execute `sql` with per-call options
    pub async fn execute_with(&self, sql: &str, options: &ExecutionOptions) -> Result<ResultSet> {
        let start = Instant::now();
        let outcome = self.run(sql, options, start).await;
        let elapsed = start.elapsed();

        metrics::QUERY_DURATION.observe(elapsed.as_secs_f64());
        match &outcome {
            Ok(result) => {
                metrics::QUERIES_TOTAL.with_label_values(&["succeeded"]).inc();
                info!(
                    rows = result.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "query succeeded"
                );
            }
            Err(e) => {
                metrics::QUERIES_TOTAL.with_label_values(&[e.outcome()]).inc();
                error!(
                    sql = %sql,
                    job_id = e.job_id().unwrap_or("-"),
                    outcome = e.outcome(),
                    error = %e,
                    "query failed"
                );
            }
        }

        outcome
    }

    async fn run(&self, sql: &str, options: &ExecutionOptions, start: Instant) -> Result<ResultSet> {
        let job_id = self
            .engine
            .submit(sql, &options.database, &options.output_location)
            .await?;
        let mut job = QueryJob::new(job_id, sql);
        debug!(job_id = %job.id(), database = %options.database, "query submitted");

        self.wait_for_terminal(&mut job, options, start).await?;

        match job.state() {
            QueryState::Succeeded => {
                let raw = self.fetch_all_pages(job.id()).await?;
                Ok(decode_rows(&raw))
            }
            state => Err(QueryError::Execution {
                state: state.clone(),
                reason: job.failure_reason().unwrap_or_default().to_string(),
                job_id: job.id().to_string(),
                stats: job.stats().cloned().unwrap_or_default(),
            }),
        }
    }

    /// Poll until the job is terminal or the deadline passes
    async fn wait_for_terminal(
        &self,
        job: &mut QueryJob,
        options: &ExecutionOptions,
        start: Instant,
    ) -> Result<()> {
        loop {
            let status = self.engine.status(job.id()).await?;
            metrics::QUERY_POLLS_TOTAL.inc();
            job.record(status);

            if job.state().is_terminal() {
                debug!(job_id = %job.id(), state = %job.state(), polls = job.polls(), "query finished");
                return Ok(());
            }

            // Never sleep past the deadline; the last poll lands on it.
            let waited = start.elapsed();
            let pause = match options.max_wait {
                Some(max_wait) if waited >= max_wait => {
                    return Err(QueryError::Timeout {
                        job_id: job.id().to_string(),
                        waited,
                    });
                }
                Some(max_wait) => options.poll_interval.min(max_wait - waited),
                None => options.poll_interval,
            };

            trace!(job_id = %job.id(), state = %job.state(), "query still running");
            tokio::time::sleep(pause).await;
        }
    }

    /// Read every result page in engine order
    async fn fetch_all_pages(&self, job_id: &str) -> Result<Vec<RawRow>> {
        let mut rows = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = self.engine.fetch_page(job_id, next_token.as_deref()).await?;
            metrics::QUERY_RESULT_PAGES_TOTAL.inc();
            rows.extend(page.rows);

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(rows)
    }
}
