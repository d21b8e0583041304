//! Query job, status and result types

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::Arc;

/// One row of the engine's raw tabular payload; `None` is a cell with no value
pub type RawRow = Vec<Option<String>>;

/// Execution state reported by the query engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState {
    Running,
    Succeeded,
    Failed,
    Cancelled,
    /// Any other engine-reported state (e.g. `QUEUED`), kept verbatim
    Other(String),
}

impl QueryState {
    /// Parse an engine state name
    pub fn parse(state: &str) -> Self {
        match state {
            "RUNNING" => QueryState::Running,
            "SUCCEEDED" => QueryState::Succeeded,
            "FAILED" => QueryState::Failed,
            "CANCELLED" => QueryState::Cancelled,
            other => QueryState::Other(other.to_string()),
        }
    }

    /// `SUCCEEDED`, `FAILED` and `CANCELLED` end polling; everything else does not.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryState::Succeeded | QueryState::Failed | QueryState::Cancelled
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            QueryState::Running => "RUNNING",
            QueryState::Succeeded => "SUCCEEDED",
            QueryState::Failed => "FAILED",
            QueryState::Cancelled => "CANCELLED",
            QueryState::Other(s) => s,
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution statistics reported by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub engine_execution_time_ms: Option<i64>,
    pub total_execution_time_ms: Option<i64>,
    pub queue_time_ms: Option<i64>,
    pub data_scanned_bytes: Option<i64>,
}

impl fmt::Display for QueryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("engine_ms", self.engine_execution_time_ms),
            ("total_ms", self.total_execution_time_ms),
            ("queue_ms", self.queue_time_ms),
            ("scanned_bytes", self.data_scanned_bytes),
        ];

        f.write_str("{")?;
        let mut first = true;
        for (name, value) in fields {
            if let Some(value) = value {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{}={}", name, value)?;
                first = false;
            }
        }
        f.write_str("}")
    }
}

/// Result of a single status poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub state: QueryState,
    /// Engine-provided reason for the last state change, if any
    pub reason: Option<String>,
    pub stats: Option<QueryStats>,
}

impl JobStatus {
    pub fn new(state: QueryState) -> Self {
        Self {
            state,
            reason: None,
            stats: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_stats(mut self, stats: QueryStats) -> Self {
        self.stats = Some(stats);
        self
    }
}

/// One page of raw rows plus the continuation token for the next page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    pub rows: Vec<RawRow>,
    pub next_token: Option<String>,
}

/// A submitted query, tracked locally only by recording observed state
#[derive(Debug, Clone)]
pub struct QueryJob {
    id: String,
    sql: String,
    state: QueryState,
    failure_reason: Option<String>,
    stats: Option<QueryStats>,
    polls: u32,
}

impl QueryJob {
    /// A freshly submitted job starts out `RUNNING`
    pub fn new(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sql: sql.into(),
            state: QueryState::Running,
            failure_reason: None,
            stats: None,
            polls: 0,
        }
    }

    /// Record the outcome of one poll
    pub fn record(&mut self, status: JobStatus) {
        self.polls += 1;
        self.state = status.state;
        // Reason and stats only describe non-success terminal states.
        if matches!(self.state, QueryState::Failed | QueryState::Cancelled) {
            self.failure_reason = status.reason;
            self.stats = status.stats;
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn stats(&self) -> Option<&QueryStats> {
        self.stats.as_ref()
    }

    /// Number of status polls recorded so far
    pub fn polls(&self) -> u32 {
        self.polls
    }
}

/// A decoded row: one value per header column, matched by position
///
/// Serializes as a JSON object in column order. When the header repeats a
/// name, the later column wins both in [`Record::get`] and in the serialized
/// object; [`Record::values`] still holds every positional cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Record {
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<Option<String>>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Look up a value by column name.
    ///
    /// Returns `None` when the column does not exist and `Some(None)` when
    /// the cell is null.
    pub fn get(&self, column: &str) -> Option<Option<&str>> {
        self.columns
            .iter()
            .rposition(|c| c == column)
            .map(|idx| self.values[idx].as_deref())
    }

    /// Like [`Record::get`] but matches the column name ignoring ASCII case
    pub fn get_ignore_ascii_case(&self, column: &str) -> Option<Option<&str>> {
        self.columns
            .iter()
            .rposition(|c| c.eq_ignore_ascii_case(column))
            .map(|idx| self.values[idx].as_deref())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Cell values in header order
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Iterate `(column, value)` pairs in header order, duplicates included
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .map(|(c, v)| (c.as_str(), v.as_deref()))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (idx, (column, value)) in self.iter().enumerate() {
            if self.columns[idx + 1..].iter().any(|c| c == column) {
                continue;
            }
            map.serialize_entry(column, &value)?;
        }
        map.end()
    }
}

/// Decoded query result
///
/// Serializes as a JSON array of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    columns: Arc<[String]>,
    rows: Vec<Record>,
}

impl ResultSet {
    pub(crate) fn new(columns: Arc<[String]>, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    /// A result with no columns and no rows
    pub fn empty() -> Self {
        Self {
            columns: Arc::from(Vec::new()),
            rows: Vec::new(),
        }
    }

    /// Column names from the header row, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Record> {
        self.rows
    }

    pub fn first(&self) -> Option<&Record> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.rows.iter()
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.rows)
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(columns: &[&str], values: &[Option<&str>]) -> Record {
        let columns: Arc<[String]> = columns.iter().map(|c| c.to_string()).collect();
        Record::new(columns, values.iter().map(|v| v.map(String::from)).collect())
    }

    #[test]
    fn test_state_parse_terminal_states() {
        assert_eq!(QueryState::parse("SUCCEEDED"), QueryState::Succeeded);
        assert_eq!(QueryState::parse("FAILED"), QueryState::Failed);
        assert_eq!(QueryState::parse("CANCELLED"), QueryState::Cancelled);
        assert!(QueryState::Succeeded.is_terminal());
        assert!(QueryState::Failed.is_terminal());
        assert!(QueryState::Cancelled.is_terminal());
    }

    #[test]
    fn test_state_parse_keeps_unknown_states_non_terminal() {
        let queued = QueryState::parse("QUEUED");
        assert_eq!(queued, QueryState::Other("QUEUED".to_string()));
        assert!(!queued.is_terminal());
        assert_eq!(queued.to_string(), "QUEUED");
        assert!(!QueryState::Running.is_terminal());
    }

    #[test]
    fn test_job_starts_running() {
        let job = QueryJob::new("q-1", "SELECT 1");
        assert_eq!(job.state(), &QueryState::Running);
        assert_eq!(job.sql(), "SELECT 1");
        assert_eq!(job.polls(), 0);
    }

    #[test]
    fn test_job_records_failure_details_only_on_failure() {
        let mut job = QueryJob::new("q-1", "SELECT 1");

        job.record(JobStatus::new(QueryState::Running).with_reason("warming up"));
        assert_eq!(job.failure_reason(), None);

        job.record(
            JobStatus::new(QueryState::Failed)
                .with_reason("SYNTAX_ERROR")
                .with_stats(QueryStats {
                    engine_execution_time_ms: Some(12),
                    ..Default::default()
                }),
        );
        assert_eq!(job.state(), &QueryState::Failed);
        assert_eq!(job.failure_reason(), Some("SYNTAX_ERROR"));
        assert_eq!(job.stats().unwrap().engine_execution_time_ms, Some(12));
        assert_eq!(job.polls(), 2);
    }

    #[test]
    fn test_stats_display_skips_missing_fields() {
        let stats = QueryStats {
            engine_execution_time_ms: Some(40),
            data_scanned_bytes: Some(1024),
            ..Default::default()
        };
        assert_eq!(stats.to_string(), "{engine_ms=40, scanned_bytes=1024}");
        assert_eq!(QueryStats::default().to_string(), "{}");
    }

    #[test]
    fn test_record_get_distinguishes_missing_and_null() {
        let r = record(&["day", "revenue"], &[Some("2024-01-01"), None]);
        assert_eq!(r.get("day"), Some(Some("2024-01-01")));
        assert_eq!(r.get("revenue"), Some(None));
        assert_eq!(r.get("orders"), None);
    }

    #[test]
    fn test_record_case_insensitive_lookup() {
        let r = record(&["runid"], &[Some("run-7")]);
        assert_eq!(r.get("runId"), None);
        assert_eq!(r.get_ignore_ascii_case("runId"), Some(Some("run-7")));
    }

    #[test]
    fn test_record_duplicate_columns_later_wins() {
        let r = record(&["a", "a"], &[Some("first"), Some("second")]);
        assert_eq!(r.get("a"), Some(Some("second")));
        assert_eq!(r.values().len(), 2);

        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"a":"second"}"#);
    }

    #[test]
    fn test_record_serializes_in_column_order_with_nulls() {
        let r = record(&["day", "revenue"], &[Some("2024-01-02"), None]);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"day":"2024-01-02","revenue":null}"#);
    }

    #[test]
    fn test_empty_result_set_serializes_as_empty_array() {
        let json = serde_json::to_string(&ResultSet::empty()).unwrap();
        assert_eq!(json, "[]");
    }
}
