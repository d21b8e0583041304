//! OrderPulse Observability
//!
//! Prometheus metrics for the query executor and the HTTP API, plus a small
//! router that exposes them in the text exposition format.
//!
//! # Usage
//!
//! ```no_run
//! use orderpulse_observability::{exporter, metrics};
//!
//! metrics::init();
//! let metrics_router: axum::Router = exporter::create_metrics_router();
//! ```

pub mod exporter;
pub mod metrics;

pub use metrics::{init as init_metrics, REGISTRY};

/// Initialize all observability components
pub fn init() {
    metrics::init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_init_is_safe() {
        init();
        init();
    }

    #[test]
    fn test_registry_lists_query_metrics_after_init() {
        init();
        metrics::QUERY_POLLS_TOTAL.inc();

        let names: Vec<String> = REGISTRY
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"orderpulse_query_polls_total".to_string()));
    }
}
