//! Metrics recording implementation using Prometheus.

use prometheus::core::Collector;
use prometheus::{
    exponential_buckets, Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter,
    IntCounterVec, IntGauge, Opts, Registry, TextEncoder, DEFAULT_BUCKETS,
};
use std::sync::Arc;
use tracing::warn;

use crate::store::PoolStats;

const HTTP_LABELS: &[&str] = &["path", "method", "status_code"];
const REQUEST_SIZE_LABELS: &[&str] = &["path", "method"];

// 100 B, 1 KB, 10 KB, 100 KB, 1 MB
const SIZE_BUCKET_START: f64 = 100.0;
const SIZE_BUCKET_FACTOR: f64 = 10.0;
const SIZE_BUCKET_COUNT: usize = 5;

/// Trait for recording application metrics.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records the declared body size of an inbound request.
    fn record_request_size(&self, path: &str, method: &str, bytes: u64);

    /// Records one completed request and how long the handler took.
    fn record_http_request(&self, path: &str, method: &str, status_code: &str, duration_secs: f64);

    /// Records the number of body bytes sent for a response.
    fn record_response_size(&self, path: &str, method: &str, status_code: &str, bytes: u64);

    /// Records a persisted transaction and adds its value to the running sum.
    fn record_transaction_created(&self, status: &str, value: f64);

    /// Records a rejected or failed transaction creation.
    fn record_transaction_error(&self);

    /// Mirrors a connection-pool snapshot into the `db_*` gauges.
    fn record_pool_stats(&self, stats: &PoolStats);
}

/// Prometheus metrics collector.
///
/// Cloning is cheap and every clone writes to the same registry, so one
/// instance built at startup is shared by the middleware, the handlers and the
/// pool sampler.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // HTTP metrics
    http_request_duration_seconds: HistogramVec,
    http_requests_total: IntCounterVec,
    http_request_size_bytes: HistogramVec,
    http_response_size_bytes: HistogramVec,

    // Business metrics
    transactions_total: IntCounterVec,
    transactions_value_sum: Gauge,
    transactions_errors_total: IntCounter,

    // Connection pool metrics
    db_max_open_connections: IntGauge,
    db_open_connections: IntGauge,
    db_in_use_connections: IntGauge,
    db_idle_connections: IntGauge,
}

fn size_buckets() -> Vec<f64> {
    exponential_buckets(SIZE_BUCKET_START, SIZE_BUCKET_FACTOR, SIZE_BUCKET_COUNT)
        .expect("Invalid size bucket layout")
}

impl Metrics {
    /// Creates a new metrics instance with its own Prometheus registry.
    pub fn new() -> Self {
        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "Duration of HTTP requests",
            )
            .buckets(DEFAULT_BUCKETS.to_vec()),
            HTTP_LABELS,
        )
        .expect("Failed to create http_request_duration_seconds");

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            HTTP_LABELS,
        )
        .expect("Failed to create http_requests_total");

        let http_request_size_bytes = HistogramVec::new(
            HistogramOpts::new("http_request_size_bytes", "Size of HTTP requests")
                .buckets(size_buckets()),
            REQUEST_SIZE_LABELS,
        )
        .expect("Failed to create http_request_size_bytes");

        let http_response_size_bytes = HistogramVec::new(
            HistogramOpts::new("http_response_size_bytes", "Size of HTTP responses")
                .buckets(size_buckets()),
            HTTP_LABELS,
        )
        .expect("Failed to create http_response_size_bytes");

        let transactions_total = IntCounterVec::new(
            Opts::new("transactions_total", "Total number of transactions"),
            &["status"],
        )
        .expect("Failed to create transactions_total");

        let transactions_value_sum = Gauge::new(
            "transactions_value_sum",
            "Sum of all transaction values processed.",
        )
        .expect("Failed to create transactions_value_sum");

        let transactions_errors_total = IntCounter::new(
            "transactions_errors_total",
            "Number of failed transaction creations.",
        )
        .expect("Failed to create transactions_errors_total");

        let db_max_open_connections = IntGauge::new(
            "db_max_open_connections",
            "Maximum number of open connections to the database.",
        )
        .expect("Failed to create db_max_open_connections");
        let db_open_connections = IntGauge::new(
            "db_open_connections",
            "The number of established connections both in use and idle.",
        )
        .expect("Failed to create db_open_connections");
        let db_in_use_connections = IntGauge::new(
            "db_in_use_connections",
            "The number of connections currently in use.",
        )
        .expect("Failed to create db_in_use_connections");
        let db_idle_connections = IntGauge::new(
            "db_idle_connections",
            "The number of idle connections.",
        )
        .expect("Failed to create db_idle_connections");

        let metrics = Metrics {
            registry: Arc::new(Registry::new()),
            http_request_duration_seconds,
            http_requests_total,
            http_request_size_bytes,
            http_response_size_bytes,
            transactions_total,
            transactions_value_sum,
            transactions_errors_total,
            db_max_open_connections,
            db_open_connections,
            db_in_use_connections,
            db_idle_connections,
        };
        metrics.register_instruments();
        metrics
    }

    fn register_instruments(&self) {
        self.register(Box::new(self.http_request_duration_seconds.clone()));
        self.register(Box::new(self.http_requests_total.clone()));
        self.register(Box::new(self.http_request_size_bytes.clone()));
        self.register(Box::new(self.http_response_size_bytes.clone()));
        self.register(Box::new(self.transactions_total.clone()));
        self.register(Box::new(self.transactions_value_sum.clone()));
        self.register(Box::new(self.transactions_errors_total.clone()));
        self.register(Box::new(self.db_max_open_connections.clone()));
        self.register(Box::new(self.db_open_connections.clone()));
        self.register(Box::new(self.db_in_use_connections.clone()));
        self.register(Box::new(self.db_idle_connections.clone()));

        #[cfg(target_os = "linux")]
        self.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ));
    }

    /// Adds a collector to the registry.
    ///
    /// A conflicting or invalid registration is logged and skipped; it never
    /// fails startup. Returns whether the collector was added.
    pub fn register(&self, collector: Box<dyn Collector>) -> bool {
        match self.registry.register(collector) {
            Ok(()) => true,
            Err(e) => {
                warn!("Metrics registration skipped: {}", e);
                false
            }
        }
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn gauge_value(n: u32) -> i64 {
    i64::from(n)
}

impl MetricsRecorder for Metrics {
    fn record_request_size(&self, path: &str, method: &str, bytes: u64) {
        self.http_request_size_bytes
            .with_label_values(&[path, method])
            .observe(bytes as f64);
    }

    fn record_http_request(&self, path: &str, method: &str, status_code: &str, duration_secs: f64) {
        self.http_request_duration_seconds
            .with_label_values(&[path, method, status_code])
            .observe(duration_secs);
        self.http_requests_total
            .with_label_values(&[path, method, status_code])
            .inc();
    }

    fn record_response_size(&self, path: &str, method: &str, status_code: &str, bytes: u64) {
        self.http_response_size_bytes
            .with_label_values(&[path, method, status_code])
            .observe(bytes as f64);
    }

    fn record_transaction_created(&self, status: &str, value: f64) {
        self.transactions_total.with_label_values(&[status]).inc();
        self.transactions_value_sum.add(value);
    }

    fn record_transaction_error(&self) {
        self.transactions_errors_total.inc();
    }

    fn record_pool_stats(&self, stats: &PoolStats) {
        self.db_max_open_connections.set(gauge_value(stats.max_open));
        self.db_open_connections.set(gauge_value(stats.open));
        self.db_in_use_connections.set(gauge_value(stats.in_use));
        self.db_idle_connections.set(gauge_value(stats.idle));
    }
}
