//! Prometheus metrics middleware.
//!
//! Provides HTTP request/response metrics collection, the engine and
//! outbound-effect counters, and the Prometheus export endpoint.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

use domain::services::{EngineEvent, NotificationResult};

/// Middleware to record HTTP request metrics.
///
/// Records the following metrics:
/// - `http_requests_total`: Counter with labels (method, path, status)
/// - `http_request_duration_seconds`: Histogram with labels (method, path)
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();
    let method_str = method_to_str(&method);

    counter!(
        "http_requests_total",
        "method" => method_str,
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method_str,
        "path" => path
    )
    .record(duration);

    response
}

/// Convert HTTP method to string for metric labels.
fn method_to_str(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        _ => "OTHER",
    }
}

/// Records the events drained from the escalation engine.
pub fn record_engine_events(events: &[EngineEvent]) {
    for event in events {
        match event {
            EngineEvent::ZoneEntered { .. } => {
                counter!("zone_transitions_total", "kind" => "entered").increment(1);
            }
            EngineEvent::ZoneExited => {
                counter!("zone_transitions_total", "kind" => "exited").increment(1);
            }
            EngineEvent::SessionOpened { trigger } => {
                counter!("escalation_sessions_total", "trigger" => *trigger).increment(1);
            }
            EngineEvent::SessionResolved { outcome } => {
                counter!("escalation_outcomes_total", "outcome" => outcome.to_string())
                    .increment(1);
            }
            EngineEvent::SessionDismissed => {
                counter!("escalation_outcomes_total", "outcome" => "dismissed").increment(1);
            }
            EngineEvent::EntrySuppressed { .. } => {
                counter!("zone_entries_suppressed_total").increment(1);
            }
            EngineEvent::SampleIgnored { reason } => {
                counter!("location_samples_ignored_total", "reason" => reason.as_str())
                    .increment(1);
            }
        }
    }
}

/// Records an alarm that could not start from any sound source.
pub fn record_alarm_playback_failure() {
    counter!("alarm_playback_failures_total").increment(1);
}

/// Records the result of a danger-zone notification.
pub fn record_notification_result(result: &NotificationResult) {
    let status = match result {
        NotificationResult::Sent => "sent",
        NotificationResult::Skipped => "skipped",
        NotificationResult::Failed(_) => "failed",
    };
    counter!("notifications_total", "status" => status).increment(1);
}

/// Records an emergency call attempt.
pub fn record_emergency_call(success: bool) {
    let status = if success { "placed" } else { "failed" };
    counter!("emergency_calls_total", "status" => status).increment(1);
}

/// Handler for /metrics endpoint that returns Prometheus text format.
pub async fn metrics_handler() -> impl IntoResponse {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        let output = handle.render();
        (
            axum::http::StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            output,
        )
    } else {
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            [(axum::http::header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized".to_string(),
        )
    }
}

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum MetricsInitError {
    #[error("Failed to build Prometheus recorder: {0}")]
    Build(#[from] BuildError),

    #[error("Prometheus recorder already initialized")]
    AlreadyInitialized,
}

/// Initialize the Prometheus metrics recorder.
///
/// Must be called once during application startup before any metrics are
/// recorded. Installs the global recorder and keeps the handle for the
/// `/metrics` endpoint.
pub fn init_metrics() -> Result<(), MetricsInitError> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Err(MetricsInitError::AlreadyInitialized);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets(&[0.001, 0.005, 0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0])?
        .install_recorder()?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsInitError::AlreadyInitialized)
}
