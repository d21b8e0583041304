//! An in-memory [`QueryEngine`] that replays scripted jobs.
//!
//! Meant for tests only. Scripts are matched against submitted SQL by
//! substring, in registration order; each submission replays its script from
//! the start. Every job is kept (with its poll count) for the life of the
//! engine so tests can inspect it afterwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::engine::QueryEngine;
use crate::error::QueryError;
use crate::types::{JobStatus, QueryState, RawRow, ResultPage};
use crate::Result;

/// Build a raw row from string cells
pub fn raw_row(cells: &[Option<&str>]) -> RawRow {
    cells.iter().map(|c| c.map(String::from)).collect()
}

/// The states and result pages one job goes through
#[derive(Debug, Clone)]
pub struct ScriptedJob {
    states: Vec<JobStatus>,
    pages: Vec<Vec<RawRow>>,
    status_error_at: Option<usize>,
    page_error_at: Option<usize>,
}

impl ScriptedJob {
    /// A job that succeeds on the first poll and returns `rows` in one page
    pub fn succeeded(rows: Vec<RawRow>) -> Self {
        Self {
            states: vec![JobStatus::new(QueryState::Succeeded)],
            pages: vec![rows],
            status_error_at: None,
            page_error_at: None,
        }
    }

    /// A job that fails on the first poll
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            states: vec![JobStatus::new(QueryState::Failed).with_reason(reason)],
            pages: Vec::new(),
            status_error_at: None,
            page_error_at: None,
        }
    }

    /// A job that is cancelled on the first poll
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self {
            states: vec![JobStatus::new(QueryState::Cancelled).with_reason(reason)],
            pages: Vec::new(),
            status_error_at: None,
            page_error_at: None,
        }
    }

    /// A job that never leaves `RUNNING`
    pub fn stuck() -> Self {
        Self {
            states: vec![JobStatus::new(QueryState::Running)],
            pages: Vec::new(),
            status_error_at: None,
            page_error_at: None,
        }
    }

    /// Poll with an explicit state sequence; the last state repeats forever
    pub fn with_states(mut self, states: Vec<JobStatus>) -> Self {
        self.states = states;
        self
    }

    /// Prepend `polls` observations of `state` before the scripted states
    pub fn after(mut self, polls: usize, state: QueryState) -> Self {
        let mut states: Vec<JobStatus> = std::iter::repeat_with(|| JobStatus::new(state.clone()))
            .take(polls)
            .collect();
        states.append(&mut self.states);
        self.states = states;
        self
    }

    /// Split the result into several pages, served in order
    pub fn with_pages(mut self, pages: Vec<Vec<RawRow>>) -> Self {
        self.pages = pages;
        self
    }

    /// Fail the status poll with zero-based index `poll` with a transport error
    pub fn fail_status_at(mut self, poll: usize) -> Self {
        self.status_error_at = Some(poll);
        self
    }

    /// Fail the fetch of zero-based page `page` with a transport error
    pub fn fail_page_at(mut self, page: usize) -> Self {
        self.page_error_at = Some(page);
        self
    }
}

#[derive(Debug)]
struct JobCursor {
    script: ScriptedJob,
    polls: usize,
}

/// Scripted, in-memory query engine
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    scripts: Mutex<Vec<(String, ScriptedJob)>>,
    jobs: Mutex<HashMap<String, JobCursor>>,
    submitted: Mutex<Vec<String>>,
    next_id: AtomicU64,
    offline: AtomicBool,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any submitted SQL containing `pattern` with `job`
    pub fn script(&self, pattern: impl Into<String>, job: ScriptedJob) -> &Self {
        lock(&self.scripts).push((pattern.into(), job));
        self
    }

    /// Simulate an unreachable engine: every call fails with a transport error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// SQL statements submitted so far, in order
    pub fn submitted(&self) -> Vec<String> {
        lock(&self.submitted).clone()
    }

    /// Number of status polls received for `job_id`
    pub fn polls(&self, job_id: &str) -> usize {
        lock(&self.jobs).get(job_id).map(|j| j.polls).unwrap_or(0)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(QueryError::Transport(
                "in-memory engine is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl QueryEngine for InMemoryEngine {
    async fn submit(&self, sql: &str, _database: &str, _output_location: &str) -> Result<String> {
        self.check_online()?;

        let script = lock(&self.scripts)
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, job)| job.clone())
            .ok_or_else(|| {
                QueryError::Transport(format!("no scripted response for query: {}", sql.trim()))
            })?;

        lock(&self.submitted).push(sql.to_string());
        let job_id = format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        lock(&self.jobs).insert(job_id.clone(), JobCursor { script, polls: 0 });

        Ok(job_id)
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus> {
        self.check_online()?;

        let mut jobs = lock(&self.jobs);
        let cursor = jobs
            .get_mut(job_id)
            .ok_or_else(|| QueryError::InvalidResponse(format!("unknown job {}", job_id)))?;

        let poll = cursor.polls;
        cursor.polls += 1;
        if cursor.script.status_error_at == Some(poll) {
            return Err(QueryError::Transport(format!(
                "status poll {} for {} dropped",
                poll, job_id
            )));
        }

        let states = &cursor.script.states;
        let status = states
            .get(poll)
            .or_else(|| states.last())
            .cloned()
            .unwrap_or_else(|| JobStatus::new(QueryState::Running));

        Ok(status)
    }

    async fn fetch_page(&self, job_id: &str, next_token: Option<&str>) -> Result<ResultPage> {
        self.check_online()?;

        let jobs = lock(&self.jobs);
        let cursor = jobs
            .get(job_id)
            .ok_or_else(|| QueryError::InvalidResponse(format!("unknown job {}", job_id)))?;

        let index = match next_token {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| QueryError::InvalidResponse(format!("bad page token {}", token)))?,
        };

        if cursor.script.page_error_at == Some(index) {
            return Err(QueryError::Transport(format!(
                "page {} for {} dropped",
                index, job_id
            )));
        }

        let pages = &cursor.script.pages;
        let rows = pages.get(index).cloned().unwrap_or_default();
        let next_token = (index + 1 < pages.len()).then(|| (index + 1).to_string());

        Ok(ResultPage { rows, next_token })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unscripted_query_is_rejected() {
        let engine = InMemoryEngine::new();
        let err = engine.submit("SELECT 1", "db", "s3://out/").await.unwrap_err();
        assert!(matches!(err, QueryError::Transport(_)));
        assert!(engine.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_states_replay_then_repeat_last() {
        let engine = InMemoryEngine::new();
        engine.script(
            "SELECT",
            ScriptedJob::succeeded(vec![]).after(2, QueryState::Running),
        );

        let id = engine.submit("SELECT 1", "db", "s3://out/").await.unwrap();
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(engine.status(&id).await.unwrap().state);
        }

        assert_eq!(
            seen,
            vec![
                QueryState::Running,
                QueryState::Running,
                QueryState::Succeeded,
                QueryState::Succeeded
            ]
        );
        assert_eq!(engine.polls(&id), 4);
    }

    #[tokio::test]
    async fn test_pages_chain_through_tokens() {
        let engine = InMemoryEngine::new();
        engine.script(
            "SELECT",
            ScriptedJob::succeeded(vec![]).with_pages(vec![
                vec![raw_row(&[Some("n")])],
                vec![raw_row(&[Some("1")])],
            ]),
        );
        let id = engine.submit("SELECT n", "db", "s3://out/").await.unwrap();

        let first = engine.fetch_page(&id, None).await.unwrap();
        assert_eq!(first.next_token.as_deref(), Some("1"));
        let second = engine.fetch_page(&id, Some("1")).await.unwrap();
        assert_eq!(second.rows, vec![raw_row(&[Some("1")])]);
        assert_eq!(second.next_token, None);
    }

    #[tokio::test]
    async fn test_offline_engine_fails_every_call() {
        let engine = InMemoryEngine::new();
        engine.script("SELECT", ScriptedJob::succeeded(vec![]));
        engine.set_offline(true);

        let err = engine.submit("SELECT 1", "db", "s3://out/").await.unwrap_err();
        assert!(matches!(err, QueryError::Transport(_)));
    }
}
