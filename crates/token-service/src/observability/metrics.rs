//! Metrics definitions for the token service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `ts_` prefix for the token service
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: HTTP methods
//! - `endpoint`: 10 values (room names and ids are replaced by placeholders)
//! - `status`: success, error, timeout
//! - `role`: host, guest
//! - `operation`: admin API method names, bounded by code
//! - `error_type`: bounded by `TsError` variants

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used to render
/// `/metrics`.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("ts_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Signing is local and fast
        .set_buckets_for_metric(
            Matcher::Prefix("ts_token_issuance".to_string()),
            &[0.0005, 0.001, 0.002, 0.005, 0.010, 0.025, 0.050],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("ts_upstream_request".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set upstream request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `ts_http_requests_total`, `ts_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// Captures every response, including framework-level 404/405/408.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("ts_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("ts_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize a request path to its route template.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/health" | "/metrics" | "/token" | "/room/create" => path.to_string(),
        _ => normalize_dynamic_endpoint(path),
    }
}

fn normalize_dynamic_endpoint(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();

    match parts.as_slice() {
        ["", "room", _, "participants"] => "/room/{room}/participants".to_string(),
        ["", "room", _, "kick", _] => "/room/{room}/kick/{identity}".to_string(),
        ["", "room", _, "record", "start"] => "/room/{room}/record/start".to_string(),
        ["", "room", _, "stream", "start"] => "/room/{room}/stream/start".to_string(),
        ["", "egress", _, "stop"] => "/egress/{egress_id}/stop".to_string(),
        // Unknown paths are collapsed to bound cardinality
        _ => "/other".to_string(),
    }
}

// ============================================================================
// Token Issuance Metrics
// ============================================================================

/// Record a participant token issuance attempt.
///
/// Metric: `ts_token_issuance_total`, `ts_token_issuance_duration_seconds`
/// Labels: `role`, `status`
pub fn record_token_issuance(is_host: bool, status: &str, duration: Duration) {
    let role = if is_host { "host" } else { "guest" };

    histogram!("ts_token_issuance_duration_seconds",
        "role" => role
    )
    .record(duration.as_secs_f64());

    counter!("ts_token_issuance_total",
        "role" => role,
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Upstream (admin API) Metrics
// ============================================================================

/// Record a media server admin API call.
///
/// Metric: `ts_upstream_requests_total`, `ts_upstream_request_duration_seconds`
/// Labels: `operation`, `status`
pub fn record_upstream_request(operation: &str, status: &str, duration: Duration) {
    histogram!("ts_upstream_request_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("ts_upstream_requests_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Error Metrics
// ============================================================================

/// Record an error returned by a handler.
///
/// Metric: `ts_errors_total`
/// Labels: `operation`, `error_type`, `status_code`
pub fn record_error(operation: &str, error_type: &str, status_code: u16) {
    counter!("ts_errors_total",
        "operation" => operation.to_string(),
        "error_type" => error_type.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}
