use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::TraceContextExt;
use std::{sync::Arc, time::Instant};
use tracing::{debug, error, info, instrument, warn, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::{get_current_trace_id, Metrics};

/// Per-request server span, request log line and HTTP metrics.
///
/// Requests are labelled by their matched route template; anything the
/// router did not match is counted under `unmatched`.
pub async fn observability_middleware(
    metrics: Arc<Metrics>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map_or("unmatched", MatchedPath::as_str)
        .to_string();

    let span = tracing::info_span!(
        target: "bunnyfood_rs::http",
        "request",
        otel.name = %format!("{} {}", method, endpoint),
        otel.kind = "server",
        http.method = %method,
        http.route = %endpoint,
        http.target = %path,
        http.status_code = tracing::field::Empty,
    );

    async move {
        metrics.increment_in_flight(&method, &endpoint);
        let response = next.run(request).await;
        metrics.decrement_in_flight(&method, &endpoint);

        let status = response.status();
        let elapsed = started.elapsed();
        metrics.record_http_request(&method, &endpoint, status.as_u16(), elapsed.as_secs_f64());

        let span = tracing::Span::current();
        span.record("http.status_code", status.as_u16());
        if status.is_server_error() {
            span.context()
                .span()
                .set_status(opentelemetry::trace::Status::error(status.to_string()));
        }

        let trace_id = get_current_trace_id().unwrap_or_default();
        let duration_ms = elapsed.as_millis() as u64;
        if status.is_server_error() {
            error!(%trace_id, %method, %path, status = status.as_u16(), duration_ms, "Request failed");
        } else if status.is_client_error() {
            warn!(%trace_id, %method, %path, status = status.as_u16(), duration_ms, "Request rejected");
        } else {
            info!(%trace_id, %method, %path, status = status.as_u16(), duration_ms, "Request served");
        }

        response
    }
    .instrument(span)
    .await
}

/// Wraps database calls with metrics and a log line per call
#[derive(Clone)]
pub struct DatabaseTracingMiddleware {
    metrics: Arc<Metrics>,
}

impl DatabaseTracingMiddleware {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }

    /// Time `future`, count it under `operation`/`table`, and log failures
    #[instrument(skip_all, fields(operation = %operation, table = %table))]
    pub async fn trace_operation<F, T, E>(
        &self,
        operation: &str,
        table: &str,
        future: F,
    ) -> Result<T, E>
    where
        F: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let started = Instant::now();
        let result = future.await;
        let elapsed = started.elapsed();

        self.metrics.record_database_operation(
            operation,
            table,
            result.is_ok(),
            elapsed.as_secs_f64(),
        );
        match &result {
            Ok(_) => debug!(duration_ms = elapsed.as_millis() as u64, "Database call completed"),
            Err(error) => error!(
                error = %error,
                duration_ms = elapsed.as_millis() as u64,
                "Database call failed"
            ),
        }

        result
    }
}
