//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by outcome, status
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_transform_total` (counter): transformed / fallback / skipped bodies
//! - `proxy_session_binds_total` (counter): explicit base-origin binds
//! - `proxy_sessions_active` (gauge): live bindings at last sweep
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus scrape endpoint. Must be called inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    counter!(
        "proxy_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_transform(result: &'static str) {
    counter!("proxy_transform_total", "result" => result).increment(1);
}

pub fn record_session_bind() {
    counter!("proxy_session_binds_total").increment(1);
}

pub fn record_active_sessions(count: usize) {
    gauge!("proxy_sessions_active").set(count as f64);
}
