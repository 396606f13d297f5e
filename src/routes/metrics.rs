//! Prometheus metrics endpoint
//!
//! Exposes relay metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize metrics (call once at startup)
pub fn init_metrics() -> anyhow::Result<()> {
    PROMETHEUS_HANDLE.get_or_try_init(|| PrometheusBuilder::new().install_recorder())?;

    register_metrics();
    Ok(())
}

fn register_metrics() {
    metrics::describe_counter!(
        "relay_requests_total",
        "Chat requests by outcome before streaming (streaming or error kind)"
    );
    metrics::describe_counter!("relay_frames_total", "Text frames sent to clients");
    metrics::describe_counter!(
        "relay_streams_total",
        "Finished streams by terminal state"
    );
    metrics::describe_histogram!(
        "relay_stream_duration_seconds",
        "Time from first upstream event wait to terminal state"
    );
}

/// Prometheus metrics endpoint handler
///
/// Returns metrics in Prometheus text format for scraping.
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Record how a chat request left the handler
pub fn record_request(outcome: &str) {
    metrics::counter!("relay_requests_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a finished stream
pub fn record_stream(state: &str, frames: u64, duration_secs: f64) {
    metrics::counter!("relay_streams_total", "state" => state.to_string()).increment(1);
    metrics::counter!("relay_frames_total").increment(frames);
    metrics::histogram!("relay_stream_duration_seconds", "state" => state.to_string())
        .record(duration_secs);
}
