//! API configuration
//!
//! Read once at startup from environment variables:
//!
//! - `BUCKET_NAME`: S3 bucket for uploads and Athena output (required)
//! - `AWS_REGION`: region for S3 and Athena (default: provider chain)
//! - `ATHENA_DB`: Athena database (default: `ecom`)
//! - `ATHENA_OUTPUT`: result location (default: `s3://<BUCKET_NAME>/athena/`)
//! - `ANALYTICS_TABLE`: cleaned orders table (default: `ecom.orders_cleaned`)
//! - `QUERY_POLL_INTERVAL_MS`: status poll interval (default: 1000)
//! - `QUERY_MAX_WAIT_SECS`: polling deadline, `0` disables it (default: 300)
//! - `UPLOAD_PREFIX`: key prefix for uploads (default: `uploads/`)
//! - `UPLOAD_URL_TTL_SECS`: presigned URL lifetime (default: 300)
//! - `API_PORT`: HTTP port (default: 5000)

use std::str::FromStr;
use std::time::Duration;

use orderpulse_query::{ExecutionOptions, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL, DEFAULT_RUNS_TABLE};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable required")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bucket: String,
    pub region: Option<String>,
    pub athena_database: String,
    pub athena_output: String,
    pub analytics_table: String,
    pub poll_interval: Duration,
    pub max_wait: Option<Duration>,
    pub upload_prefix: String,
    pub upload_url_ttl: Duration,
    pub port: u16,
}

impl ApiConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bucket = var("BUCKET_NAME").ok_or(ConfigError::Missing("BUCKET_NAME"))?;
        let athena_output =
            var("ATHENA_OUTPUT").unwrap_or_else(|| format!("s3://{}/athena/", bucket));

        let poll_interval = match parse_var::<u64>(&var, "QUERY_POLL_INTERVAL_MS")? {
            Some(ms) => Duration::from_millis(ms),
            None => DEFAULT_POLL_INTERVAL,
        };
        let max_wait = match parse_var::<u64>(&var, "QUERY_MAX_WAIT_SECS")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_MAX_WAIT),
        };
        let upload_url_ttl = Duration::from_secs(
            parse_var::<u64>(&var, "UPLOAD_URL_TTL_SECS")?.unwrap_or(300),
        );
        let port = parse_var::<u16>(&var, "API_PORT")?.unwrap_or(5000);

        Ok(Self {
            region: var("AWS_REGION"),
            athena_database: var("ATHENA_DB").unwrap_or_else(|| "ecom".to_string()),
            athena_output,
            analytics_table: var("ANALYTICS_TABLE")
                .unwrap_or_else(|| DEFAULT_RUNS_TABLE.to_string()),
            poll_interval,
            max_wait,
            upload_prefix: var("UPLOAD_PREFIX").unwrap_or_else(|| "uploads/".to_string()),
            upload_url_ttl,
            port,
            bucket,
        })
    }

    /// Executor settings derived from this configuration
    pub fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions::new(&self.athena_database, &self.athena_output)
            .with_poll_interval(self.poll_interval)
            .with_max_wait(self.max_wait)
    }
}

fn parse_var<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match var(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(None),
    }
}
