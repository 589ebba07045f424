//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_requests_total` (counter): inbound requests by method, status
//! - `balancer_request_duration_seconds` (histogram): end-to-end latency
//! - `balancer_backend_requests_total` (counter): forwards per backend
//! - `balancer_retries_total` (counter): same-backend retries by backend
//! - `balancer_failovers_total` (counter): failovers away from a backend
//! - `balancer_backend_alive` (gauge): 1=alive, 0=dead
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("balancer_requests_total", "Inbound requests handled");
    describe_histogram!(
        "balancer_request_duration_seconds",
        "End-to-end request latency including retries"
    );
    describe_counter!("balancer_backend_requests_total", "Requests forwarded to each backend");
    describe_counter!("balancer_retries_total", "Same-backend retries");
    describe_counter!("balancer_failovers_total", "Requests rerouted away from a backend");
    describe_gauge!("balancer_backend_alive", "Backend liveness (1=alive, 0=dead)");

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("balancer_requests_total", &labels).increment(1);
    histogram!("balancer_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_backend_request(backend: &str) {
    counter!("balancer_backend_requests_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_retry(backend: &str) {
    counter!("balancer_retries_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_failover(backend: &str) {
    counter!("balancer_failovers_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_backend_health(backend: &str, alive: bool) {
    gauge!("balancer_backend_alive", "backend" => backend.to_string()).set(if alive { 1.0 } else { 0.0 });
}
