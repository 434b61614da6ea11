//! Metrics collection and exposition.
//!
//! # Metrics
//! - `quote_requests_total` (counter): requests by status and outcome
//! - `quote_request_duration_seconds` (histogram): end-to-end latency
//! - `quote_stage_total` (counter): stage runs by stage and outcome
//! - `quote_stage_duration_seconds` (histogram): per-stage latency
//!
//! Without an installed recorder every call here is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::quoting::Stage;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "quote_requests_total",
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("quote_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_stage(stage: Stage, ok: bool, start: Instant) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!(
        "quote_stage_total",
        "stage" => stage.as_str(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("quote_stage_duration_seconds", "stage" => stage.as_str())
        .record(start.elapsed().as_secs_f64());
}
