//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): completed requests by method, status
//! - `gate_request_duration_seconds` (histogram): latency distribution
//! - `gate_rejections_total` (counter): admission rejections by reason

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, duration: Duration) {
    metrics::counter!(
        "gate_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gate_request_duration_seconds").record(duration.as_secs_f64());
}

pub fn record_rejection(reason: &'static str) {
    metrics::counter!("gate_rejections_total", "reason" => reason).increment(1);
}
