//! Metrics collection and exposition.
//!
//! # Metrics
//! - `client_identity_requests_total` (counter): requests seen by the guard
//! - `client_identity_rejections_total` (counter): 403s, by policy
//! - `client_identity_pattern_changes_total` (counter): admin edits, by category and op
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request() {
    metrics::counter!("client_identity_requests_total").increment(1);
}

pub fn record_rejection(policy: &'static str) {
    metrics::counter!("client_identity_rejections_total", "policy" => policy).increment(1);
}

pub fn record_pattern_change(category: &'static str, op: &'static str) {
    metrics::counter!(
        "client_identity_pattern_changes_total",
        "category" => category,
        "op" => op
    )
    .increment(1);
}
