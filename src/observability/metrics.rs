//! Metrics collection and exposition.
//!
//! # Metrics
//! - `articles_requests_total` (counter): total requests by method, status
//! - `articles_request_duration_seconds` (histogram): latency distribution
//! - `articles_upstream_failures_total` (counter): failed suggestions calls
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter runs its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one finished inbound request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("articles_requests_total", &labels).increment(1);
    metrics::histogram!("articles_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record one failed call to the suggestions service.
pub fn record_upstream_failure(kind: &'static str) {
    metrics::counter!("articles_upstream_failures_total", "kind" => kind).increment(1);
}
