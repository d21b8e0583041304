use lazy_static::lazy_static;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Once;

static INIT: Once = Once::new();

lazy_static! {
    /// Global Prometheus metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Query Metrics
    // ============================================================================

    /// Finished queries by outcome (succeeded, failed, cancelled, timeout, transport, invalid_response)
    pub static ref QUERIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("orderpulse_queries_total", "Total queries executed by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    /// Wall-clock time from submission to decoded result or error
    pub static ref QUERY_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new("orderpulse_query_duration_seconds", "Query duration in seconds")
            .buckets(vec![0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
    ).expect("metric can be created");

    /// Status polls issued against the query engine
    pub static ref QUERY_POLLS_TOTAL: IntCounter = IntCounter::new(
        "orderpulse_query_polls_total",
        "Total query status polls"
    ).expect("metric can be created");

    /// Result pages fetched from the query engine
    pub static ref QUERY_RESULT_PAGES_TOTAL: IntCounter = IntCounter::new(
        "orderpulse_query_result_pages_total",
        "Total result pages fetched"
    ).expect("metric can be created");

    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    /// Requests by endpoint and status code
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("orderpulse_http_requests_total", "Total HTTP requests"),
        &["endpoint", "status"]
    ).expect("metric can be created");

    /// Presigned upload URLs issued
    pub static ref UPLOAD_URLS_TOTAL: IntCounter = IntCounter::new(
        "orderpulse_upload_urls_total",
        "Total presigned upload URLs issued"
    ).expect("metric can be created");
}

/// Initialize metrics registry
/// Can be called multiple times safely (idempotent)
pub fn init() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(QUERIES_TOTAL.clone()))
            .expect("queries_total can be registered");
        REGISTRY
            .register(Box::new(QUERY_DURATION.clone()))
            .expect("query_duration can be registered");
        REGISTRY
            .register(Box::new(QUERY_POLLS_TOTAL.clone()))
            .expect("query_polls_total can be registered");
        REGISTRY
            .register(Box::new(QUERY_RESULT_PAGES_TOTAL.clone()))
            .expect("query_result_pages_total can be registered");

        REGISTRY
            .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
            .expect("http_requests_total can be registered");
        REGISTRY
            .register(Box::new(UPLOAD_URLS_TOTAL.clone()))
            .expect("upload_urls_total can be registered");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        init();
    }

    #[test]
    fn test_query_outcome_counter() {
        let before = QUERIES_TOTAL.with_label_values(&["succeeded"]).get();
        QUERIES_TOTAL.with_label_values(&["succeeded"]).inc();

        assert_eq!(
            QUERIES_TOTAL.with_label_values(&["succeeded"]).get(),
            before + 1
        );
    }

    #[test]
    fn test_http_request_counter_labels_are_independent() {
        let ok_before = HTTP_REQUESTS_TOTAL
            .with_label_values(&["test_endpoint", "200"])
            .get();
        let err_before = HTTP_REQUESTS_TOTAL
            .with_label_values(&["test_endpoint", "500"])
            .get();

        HTTP_REQUESTS_TOTAL
            .with_label_values(&["test_endpoint", "500"])
            .inc_by(2);

        assert_eq!(
            HTTP_REQUESTS_TOTAL
                .with_label_values(&["test_endpoint", "200"])
                .get(),
            ok_before
        );
        assert_eq!(
            HTTP_REQUESTS_TOTAL
                .with_label_values(&["test_endpoint", "500"])
                .get(),
            err_before + 2
        );
    }
}
