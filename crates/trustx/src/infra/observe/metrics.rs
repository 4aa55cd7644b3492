/// Metrics for the adapter.
#[derive(Debug, Clone, prometheus_metric_storage::MetricStorage)]
pub struct Metrics {
    /// Demand requests by outcome.
    #[metric(labels("outcome"))]
    pub requests: prometheus::IntCounterVec,
    /// Time until a demand request completed, failed or timed out.
    #[metric(
        labels("outcome"),
        buckets(0.05, 0.1, 0.2, 0.3, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 5.0, 10.0)
    )]
    pub request_duration: prometheus::HistogramVec,
    /// Received bids by whether they were accepted or why they were dropped.
    #[metric(labels("result"))]
    pub bids: prometheus::IntCounterVec,
    /// Responses that arrived after the caller stopped waiting.
    pub late_responses: prometheus::IntCounter,
}

/// Setup the metrics registry.
pub fn init() {
    observe::metrics::setup_registry_reentrant(Some("trustx".to_owned()));
}

/// Get the metrics instance.
pub fn get() -> &'static Metrics {
    Metrics::instance(observe::metrics::get_storage_registry())
        .expect("unexpected error getting metrics instance")
}
