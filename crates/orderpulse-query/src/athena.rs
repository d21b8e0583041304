//! Amazon Athena engine

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{
    QueryExecutionContext, QueryExecutionStatistics, ResultConfiguration,
};
use aws_sdk_athena::Client;

use crate::engine::QueryEngine;
use crate::error::QueryError;
use crate::types::{JobStatus, QueryState, QueryStats, RawRow, ResultPage};
use crate::Result;

/// Attempts per Athena API call, first try included
pub const ATHENA_MAX_ATTEMPTS: u32 = 5;

/// [`QueryEngine`] backed by the Athena API
#[derive(Debug, Clone)]
pub struct AthenaEngine {
    client: Client,
}

impl AthenaEngine {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard AWS provider chain.
    ///
    /// `region` overrides the region the chain would otherwise resolve.
    /// Throttled and transient failures are retried in standard mode up to
    /// [`ATHENA_MAX_ATTEMPTS`] times before surfacing as transport errors.
    pub async fn from_env(region: Option<String>) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).retry_config(retry_config());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let config = loader.load().await;

        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl QueryEngine for AthenaEngine {
    async fn submit(&self, sql: &str, database: &str, output_location: &str) -> Result<String> {
        let output = self
            .client
            .start_query_execution()
            .query_string(sql)
            .query_execution_context(QueryExecutionContext::builder().database(database).build())
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(output_location)
                    .build(),
            )
            .send()
            .await
            .map_err(transport_error)?;

        output
            .query_execution_id()
            .map(str::to_string)
            .ok_or_else(|| {
                QueryError::InvalidResponse(
                    "StartQueryExecution returned no QueryExecutionId".to_string(),
                )
            })
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus> {
        let output = self
            .client
            .get_query_execution()
            .query_execution_id(job_id)
            .send()
            .await
            .map_err(transport_error)?;

        let execution = output.query_execution().ok_or_else(|| {
            QueryError::InvalidResponse(format!("no QueryExecution for {}", job_id))
        })?;
        let status = execution.status().ok_or_else(|| {
            QueryError::InvalidResponse(format!("no Status for {}", job_id))
        })?;

        // A missing state is treated as non-terminal; the deadline still applies.
        let state = status
            .state()
            .map(|s| QueryState::parse(s.as_str()))
            .unwrap_or_else(|| QueryState::Other("UNKNOWN".to_string()));

        Ok(JobStatus {
            state,
            reason: status.state_change_reason().map(str::to_string),
            stats: execution.statistics().map(convert_stats),
        })
    }

    async fn fetch_page(&self, job_id: &str, next_token: Option<&str>) -> Result<ResultPage> {
        let output = self
            .client
            .get_query_results()
            .query_execution_id(job_id)
            .set_next_token(next_token.map(str::to_string))
            .send()
            .await
            .map_err(transport_error)?;

        let rows: Vec<RawRow> = output
            .result_set()
            .map(|result_set| {
                result_set
                    .rows()
                    .iter()
                    .map(|row| {
                        row.data()
                            .iter()
                            .map(|datum| datum.var_char_value().map(str::to_string))
                            .collect()
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ResultPage {
            rows,
            next_token: output.next_token().map(str::to_string),
        })
    }
}

fn retry_config() -> RetryConfig {
    RetryConfig::standard().with_max_attempts(ATHENA_MAX_ATTEMPTS)
}

fn convert_stats(stats: &QueryExecutionStatistics) -> QueryStats {
    QueryStats {
        engine_execution_time_ms: stats.engine_execution_time_in_millis(),
        total_execution_time_ms: stats.total_execution_time_in_millis(),
        queue_time_ms: stats.query_queue_time_in_millis(),
        data_scanned_bytes: stats.data_scanned_in_bytes(),
    }
}

fn transport_error<E>(err: E) -> QueryError
where
    E: std::error::Error,
{
    QueryError::Transport(DisplayErrorContext(err).to_string())
}
