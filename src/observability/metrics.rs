use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Prometheus series for the food catalog service.
///
/// HTTP series are labelled by route template (`/:key`), never by the raw
/// path, so food names do not grow the label space.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: GaugeVec,
    pub database_operations_total: CounterVec,
    pub database_operation_duration_seconds: HistogramVec,
    pub food_operations_total: CounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let metrics = Metrics {
            http_requests_total: counter(
                &registry,
                "http_requests_total",
                "HTTP requests by method, route and status code",
                &["method", "endpoint", "status_code"],
            )?,
            http_request_duration_seconds: histogram(
                &registry,
                "http_request_duration_seconds",
                "HTTP request latency",
                &["method", "endpoint"],
            )?,
            http_requests_in_flight: {
                let gauge = GaugeVec::new(
                    Opts::new("http_requests_in_flight", "HTTP requests being served"),
                    &["method", "endpoint"],
                )?;
                registry.register(Box::new(gauge.clone()))?;
                gauge
            },
            database_operations_total: counter(
                &registry,
                "database_operations_total",
                "DynamoDB calls by operation, table and outcome",
                &["operation", "table", "status"],
            )?,
            database_operation_duration_seconds: histogram(
                &registry,
                "database_operation_duration_seconds",
                "DynamoDB call latency",
                &["operation", "table"],
            )?,
            food_operations_total: counter(
                &registry,
                "food_operations_total",
                "Catalog operations by outcome",
                &["operation", "status"],
            )?,
            registry,
        };

        info!("Prometheus metrics registered");
        Ok(metrics)
    }

    /// Render the registry in the Prometheus text exposition format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    pub fn record_http_request(
        &self,
        method: &str,
        endpoint: &str,
        status_code: u16,
        duration_seconds: f64,
    ) {
        self.http_requests_total
            .with_label_values(&[method, endpoint, &status_code.to_string()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration_seconds);
    }

    pub fn record_database_operation(
        &self,
        operation: &str,
        table: &str,
        success: bool,
        duration_seconds: f64,
    ) {
        let status = if success { "success" } else { "error" };
        self.database_operations_total
            .with_label_values(&[operation, table, status])
            .inc();
        self.database_operation_duration_seconds
            .with_label_values(&[operation, table])
            .observe(duration_seconds);
    }

    /// Record a catalog operation; `status` is e.g. "success" or "not_found"
    pub fn record_food_operation(&self, operation: &str, status: &str) {
        self.food_operations_total
            .with_label_values(&[operation, status])
            .inc();
    }

    pub fn increment_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .inc();
    }

    pub fn decrement_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .dec();
    }
}

fn counter(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<CounterVec, MetricsError> {
    let counter = CounterVec::new(Opts::new(name, help), labels)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

fn histogram(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<HistogramVec, MetricsError> {
    let histogram = HistogramVec::new(
        HistogramOpts::new(name, help).buckets(LATENCY_BUCKETS.to_vec()),
        labels,
    )?;
    registry.register(Box::new(histogram.clone()))?;
    Ok(histogram)
}
