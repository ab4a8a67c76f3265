use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: HTTP requests served. Labels: method, status.
pub const HTTP_REQUESTS_TOTAL: &str = "roombook_http_requests_total";

/// Histogram: HTTP request latency in seconds. Labels: method.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "roombook_http_request_duration_seconds";

// ── Domain metrics ──────────────────────────────────────────────

/// Counter: reservations accepted.
pub const RESERVATIONS_CREATED_TOTAL: &str = "roombook_reservations_created_total";

/// Counter: reservations refused. Labels: reason.
pub const RESERVATIONS_REJECTED_TOTAL: &str = "roombook_reservations_rejected_total";

/// Counter: reservations cancelled.
pub const RESERVATIONS_CANCELLED_TOTAL: &str = "roombook_reservations_cancelled_total";

/// Gauge: reservations currently stored.
pub const RESERVATIONS_ACTIVE: &str = "roombook_reservations_active";

/// Gauge: rooms currently stored.
pub const ROOMS_ACTIVE: &str = "roombook_rooms_active";

/// Counter: login attempts. Labels: outcome.
pub const LOGINS_TOTAL: &str = "roombook_logins_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Bucket an HTTP status into a low-cardinality label.
pub fn status_label(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}
