//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_requests_total` (counter): requests by method, status, backend
//! - `balancer_request_duration_seconds` (histogram): latency distribution
//! - `balancer_backend_healthy` (gauge): 1=healthy, 0=unhealthy
//! - `balancer_pool_exhausted_total` (counter): requests rejected for lack of a backend
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus recorder.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, backend: &str, start_time: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("backend", backend.to_string()),
    ];

    ::metrics::counter!("balancer_requests_total", &labels).increment(1);
    ::metrics::histogram!("balancer_request_duration_seconds", &labels)
        .record(start_time.elapsed().as_secs_f64());
}

/// Record a backend's health state.
pub fn record_backend_health(backend: &str, healthy: bool) {
    ::metrics::gauge!("balancer_backend_healthy", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

/// Record a request rejected because no backend was eligible.
pub fn record_pool_exhausted() {
    ::metrics::counter!("balancer_pool_exhausted_total").increment(1);
}
