//! Mock Anthropic Messages API for testing
//!
//! Provides wiremock-based mocks for `POST /v1/messages` with `stream: true`:
//! successful SSE streams, rate limiting, provider errors and slow responses.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::mocks::anthropic::MockAnthropic;
//!
//! #[tokio::test]
//! async fn test_with_anthropic_mock() {
//!     let anthropic = MockAnthropic::start().await;
//!     anthropic.mock_stream_text(&["Hel", "lo!"]).await;
//!
//!     // Use anthropic.uri() as ANTHROPIC_API_URL
//! }
//! ```

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::{
    matchers::{header, header_exists, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Path of the Messages API
pub const MESSAGES_PATH: &str = "/v1/messages";

/// Mock Anthropic server wrapper
pub struct MockAnthropic {
    server: MockServer,
}

impl MockAnthropic {
    /// Start a new mock Anthropic server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get the mock server URI
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Respond to a streaming request with the given text deltas
    pub async fn mock_stream_text(&self, deltas: &[&str]) {
        self.mock_stream_body(AnthropicTestData::stream_body(deltas))
            .await;
    }

    /// Respond to a streaming request with a raw SSE body
    pub async fn mock_stream_body(&self, body: String) {
        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .and(header_exists("x-api-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(Self::sse_response(body))
            .mount(&self.server)
            .await;
    }

    /// Respond with a stream only after a delay
    pub async fn mock_slow_stream(&self, deltas: &[&str], delay: Duration) {
        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(
                Self::sse_response(AnthropicTestData::stream_body(deltas)).set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock 429 rate limiting
    pub async fn mock_rate_limited(&self, retry_after: Option<&str>) {
        let mut template = ResponseTemplate::new(429).set_body_json(AnthropicTestData::error_body(
            "rate_limit_error",
            "Number of request tokens has exceeded your per-minute rate limit",
        ));
        if let Some(seconds) = retry_after {
            template = template.insert_header("retry-after", seconds);
        }

        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }

    /// Mock an error status with an Anthropic-style error body
    pub async fn mock_error(&self, status: u16, error_type: &str, message: &str) {
        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(AnthropicTestData::error_body(error_type, message)),
            )
            .mount(&self.server)
            .await;
    }

    /// Fail the test on drop if any request reaches the provider
    pub async fn expect_no_requests(&self) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .named("no upstream traffic")
            .mount(&self.server)
            .await;
    }

    /// Requests received so far
    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    fn sse_response(body: String) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .set_body_raw(body.into_bytes(), "text/event-stream")
            .insert_header("cache-control", "no-cache")
    }
}

/// Test data builders in Anthropic's wire format
pub struct AnthropicTestData;

impl AnthropicTestData {
    fn event(name: &str, data: Value) -> String {
        format!("event: {}\ndata: {}\n\n", name, data)
    }

    /// A complete, well-formed streaming body producing `deltas`
    pub fn stream_body(deltas: &[&str]) -> String {
        let mut body = String::new();
        body.push_str(&Self::stream_prefix());
        for text in deltas {
            body.push_str(&Self::text_delta(text));
        }
        body.push_str(&Self::stream_suffix());
        body
    }

    /// Events a real stream sends before the first text delta
    pub fn stream_prefix() -> String {
        let mut body = Self::event(
            "message_start",
            json!({
                "type": "message_start",
                "message": {
                    "id": "msg_test123",
                    "type": "message",
                    "role": "assistant",
                    "content": [],
                    "model": "claude-sonnet-4-20250514",
                    "stop_reason": null,
                    "usage": {"input_tokens": 12, "output_tokens": 1}
                }
            }),
        );
        body.push_str(&Self::event(
            "content_block_start",
            json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
        ));
        body.push_str(&Self::event("ping", json!({"type": "ping"})));
        body
    }

    /// One `text_delta` event
    pub fn text_delta(text: &str) -> String {
        Self::event(
            "content_block_delta",
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": text}}),
        )
    }

    /// Events a real stream sends after the last text delta
    pub fn stream_suffix() -> String {
        let mut body = Self::event(
            "content_block_stop",
            json!({"type": "content_block_stop", "index": 0}),
        );
        body.push_str(&Self::event(
            "message_delta",
            json!({"type": "message_delta", "delta": {"stop_reason": "end_turn", "stop_sequence": null}, "usage": {"output_tokens": 5}}),
        ));
        body.push_str(&Self::event("message_stop", json!({"type": "message_stop"})));
        body
    }

    /// An in-stream `error` event
    pub fn error_event(error_type: &str, message: &str) -> String {
        Self::event("error", Self::error_body(error_type, message))
    }

    /// Anthropic error envelope
    pub fn error_body(error_type: &str, message: &str) -> Value {
        json!({
            "type": "error",
            "error": {"type": error_type, "message": message}
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_stream_serves_sse() {
        let mock = MockAnthropic::start().await;
        mock.mock_stream_text(&["Hi"]).await;

        let response = reqwest::Client::new()
            .post(format!("{}{}", mock.uri(), MESSAGES_PATH))
            .header("x-api-key", "test")
            .header("anthropic-version", "2023-06-01")
            .body("{}")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/event-stream"
        );
        let body = response.text().await.unwrap();
        assert!(body.contains("\"text_delta\""));
        assert!(body.ends_with("data: {\"type\":\"message_stop\"}\n\n"));
    }

    #[tokio::test]
    async fn test_mock_rate_limited_sets_retry_after() {
        let mock = MockAnthropic::start().await;
        mock.mock_rate_limited(Some("12")).await;

        let response = reqwest::Client::new()
            .post(format!("{}{}", mock.uri(), MESSAGES_PATH))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 429);
        assert_eq!(response.headers().get("retry-after").unwrap(), "12");
    }

    #[test]
    fn test_stream_body_order() {
        let body = AnthropicTestData::stream_body(&["a", "b"]);
        let a = body.find("\"text\":\"a\"").unwrap();
        let b = body.find("\"text\":\"b\"").unwrap();
        assert!(body.find("message_start").unwrap() < a);
        assert!(a < b);
        assert!(b < body.find("message_stop").unwrap());
    }
}
