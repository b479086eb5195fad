use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Credential metrics
    pub tokens_issued: IntCounter,
    pub token_cache_hits: IntCounter,
    pub token_cache_resets: IntCounter,
    pub credential_failures: IntCounterVec,
    pub token_expiry_unix: IntGauge,

    // Upstream metrics
    pub upstream_requests: IntCounterVec,
    pub upstream_failures: IntCounterVec,
    pub upstream_duration: HistogramVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("qweather_auth".into()), None)
            .unwrap_or_else(|_| Registry::new());

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Credentials
            tokens_issued: IntCounter::new("tokens_issued_total", "Tokens signed").unwrap(),
            token_cache_hits: IntCounter::new("token_cache_hits_total", "Tokens served from cache").unwrap(),
            token_cache_resets: IntCounter::new("token_cache_resets_total", "Explicit cache resets").unwrap(),
            credential_failures: IntCounterVec::new(Opts::new("credential_failures_total", "Token issuance failures by reason"), &["reason"]).unwrap(),
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Expiry of the cached token").unwrap(),

            // Upstream
            upstream_requests: IntCounterVec::new(Opts::new("upstream_requests_total", "Weather API requests"), &["endpoint"]).unwrap(),
            upstream_failures: IntCounterVec::new(Opts::new("upstream_failures_total", "Weather API failures by reason"), &["endpoint", "reason"]).unwrap(),
            upstream_duration: HistogramVec::new(HistogramOpts::new("upstream_request_duration_seconds", "Weather API request duration seconds").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]), &["endpoint"]).unwrap(),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.tokens_issued.clone())).unwrap();
        reg.register(Box::new(metrics.token_cache_hits.clone())).unwrap();
        reg.register(Box::new(metrics.token_cache_resets.clone())).unwrap();
        reg.register(Box::new(metrics.credential_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.upstream_requests.clone())).unwrap();
        reg.register(Box::new(metrics.upstream_failures.clone())).unwrap();
        reg.register(Box::new(metrics.upstream_duration.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
