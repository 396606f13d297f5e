//! Health and metrics endpoint tests

use pretty_assertions::assert_eq;
use serde_json::Value;

use chat_relay::config::PLACEHOLDER_API_KEY;

use crate::common::RelayTestHarness;

#[tokio::test]
async fn test_health_configured_is_healthy() {
    let harness = RelayTestHarness::new().await;

    let response = harness.server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["checks"]["upstream"]["provider"], "anthropic");
    assert_eq!(body["checks"]["upstream"]["configured"], true);
    assert!(body["uptime_seconds"].is_u64());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_without_key_is_degraded_but_200() {
    for key in [None, Some(PLACEHOLDER_API_KEY)] {
        let harness = RelayTestHarness::with_api_key(key).await;
        harness.anthropic.expect_no_requests().await;

        let response = harness.server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"]["upstream"]["configured"], false);
    }
}

#[tokio::test]
async fn test_liveness() {
    let harness = RelayTestHarness::with_api_key(None).await;

    let response = harness.server.get("/health/live").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), serde_json::json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_metrics_endpoint_responds() {
    let harness = RelayTestHarness::new().await;

    let response = harness.server.get("/metrics").await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let harness = RelayTestHarness::new().await;

    let response = harness.server.get("/api/unknown").await;

    response.assert_status_not_found();
}
