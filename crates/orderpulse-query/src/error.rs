//! Query error types

use std::time::Duration;

use thiserror::Error;

use crate::types::{QueryState, QueryStats};

/// Errors surfaced by the query executor
///
/// An empty result or a missing run id is never an error; those are plain
/// values (`ResultSet::is_empty`, `None`).
#[derive(Debug, Error)]
pub enum QueryError {
    /// The engine could not be reached, or rejected a request outright
    #[error("Transport error: {0}")]
    Transport(String),

    /// The job reached `FAILED` or `CANCELLED`
    #[error("Query failed: state={state} reason={reason} executionId={job_id} stats={stats}")]
    Execution {
        state: QueryState,
        reason: String,
        job_id: String,
        stats: QueryStats,
    },

    /// The job did not reach a terminal state before the polling deadline
    #[error("Timeout: query {job_id} still not finished after {waited:?}")]
    Timeout { job_id: String, waited: Duration },

    /// The engine answered without a field the executor needs
    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),
}

impl QueryError {
    /// Short label used for metrics and log fields
    pub fn outcome(&self) -> &'static str {
        match self {
            QueryError::Transport(_) => "transport",
            QueryError::Execution {
                state: QueryState::Cancelled,
                ..
            } => "cancelled",
            QueryError::Execution { .. } => "failed",
            QueryError::Timeout { .. } => "timeout",
            QueryError::InvalidResponse(_) => "invalid_response",
        }
    }

    /// Engine job id, when the failure happened after submission
    pub fn job_id(&self) -> Option<&str> {
        match self {
            QueryError::Execution { job_id, .. } | QueryError::Timeout { job_id, .. } => {
                Some(job_id)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_message_carries_diagnostics() {
        let err = QueryError::Execution {
            state: QueryState::Failed,
            reason: "SYNTAX_ERROR: line 1:8".to_string(),
            job_id: "abc-123".to_string(),
            stats: QueryStats {
                engine_execution_time_ms: Some(5),
                ..Default::default()
            },
        };

        let msg = err.to_string();
        assert!(msg.contains("state=FAILED"));
        assert!(msg.contains("reason=SYNTAX_ERROR: line 1:8"));
        assert!(msg.contains("executionId=abc-123"));
        assert!(msg.contains("engine_ms=5"));
        assert_eq!(err.outcome(), "failed");
        assert_eq!(err.job_id(), Some("abc-123"));
    }

    #[test]
    fn test_outcome_labels() {
        let cancelled = QueryError::Execution {
            state: QueryState::Cancelled,
            reason: String::new(),
            job_id: "j".to_string(),
            stats: QueryStats::default(),
        };
        assert_eq!(cancelled.outcome(), "cancelled");
        assert_eq!(QueryError::Transport("down".into()).outcome(), "transport");
        assert_eq!(QueryError::Transport("down".into()).job_id(), None);
        assert_eq!(
            QueryError::Timeout {
                job_id: "j".into(),
                waited: Duration::from_secs(3)
            }
            .outcome(),
            "timeout"
        );
    }
}
