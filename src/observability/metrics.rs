//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_route_lookups_total` (counter): matcher outcomes
//! - `gateway_route_table_generation` (gauge): current snapshot generation
//! - `gateway_programmed_routes` (gauge): routes in the current snapshot
//!
//! # Design Decisions
//! - Macros are no-ops until a recorder is installed, so tests need no setup
//! - Labels use route keys, never raw paths, to bound cardinality

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed proxied request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of one route lookup.
pub fn record_lookup(result: &'static str) {
    counter!("gateway_route_lookups_total", "result" => result).increment(1);
}

/// Record a freshly published route snapshot.
pub fn record_route_table(generation: u64, routes: usize) {
    gauge!("gateway_route_table_generation").set(generation as f64);
    gauge!("gateway_programmed_routes").set(routes as f64);
}
