//! Anthropic Messages API provider
//!
//! Opens a streaming `POST /v1/messages` call and decodes the provider's SSE
//! body into [`ProviderEvent`]s.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use super::headers::{build_anthropic_headers, retry_after_seconds};
use super::provider::{ChatProvider, EventStream, ProviderEvent, StreamError};
use crate::chat::{ChatMessage, ChatRequest};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::streaming::SseLineBuffer;

/// Model used for every chat
pub const MODEL: &str = "claude-sonnet-4-20250514";

/// Output budget for a single reply
pub const MAX_TOKENS: u32 = 1024;

/// System instruction prepended to every conversation
pub const SYSTEM_PROMPT: &str = "You are the friendly assistant on a small business website. \
Answer visitors' questions about the business's services, how engagements work, and how to get in touch. \
Keep replies short, warm, and practical. If you are unsure about a detail such as pricing or availability, \
say so and suggest the visitor use the contact form.";

/// Body of a streaming Messages API request
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// Minimal view of a streamed event; only the fields the relay needs
#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    delta: Option<EventDelta>,
    #[serde(default)]
    error: Option<EventError>,
}

#[derive(Debug, Deserialize)]
struct EventDelta {
    #[serde(rename = "type", default)]
    delta_type: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventError {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    message: String,
}

/// Result of decoding one SSE line
#[derive(Debug, PartialEq, Eq)]
enum LineOutcome {
    Event(ProviderEvent),
    Stop,
    Skip,
}

/// Decode a single SSE line from the provider body.
///
/// Only `data:` lines carry payload; `event:`, `id:` and comment lines are
/// skipped because the JSON payload repeats the event type.
fn decode_line(line: &str) -> Result<LineOutcome, StreamError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(LineOutcome::Skip);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(LineOutcome::Skip);
    }
    if data == "[DONE]" {
        return Ok(LineOutcome::Stop);
    }

    let event: StreamEvent = serde_json::from_str(data).map_err(|e| {
        StreamError::Parse(format!(
            "{} (payload: {})",
            e,
            data.chars().take(200).collect::<String>()
        ))
    })?;

    match event.event_type.as_str() {
        "content_block_delta" => match event.delta {
            Some(EventDelta {
                delta_type: Some(ref kind),
                text: Some(text),
            }) if kind == "text_delta" => Ok(LineOutcome::Event(ProviderEvent::TextDelta(text))),
            Some(EventDelta {
                delta_type: Some(kind),
                ..
            }) => Ok(LineOutcome::Event(ProviderEvent::Other(kind))),
            _ => Ok(LineOutcome::Event(ProviderEvent::Other(event.event_type))),
        },
        "message_stop" => Ok(LineOutcome::Stop),
        "error" => {
            let (kind, message) = event
                .error
                .map(|e| (e.error_type, e.message))
                .unwrap_or_else(|| ("unknown".to_string(), String::new()));
            Err(StreamError::Provider { kind, message })
        }
        _ => Ok(LineOutcome::Event(ProviderEvent::Other(event.event_type))),
    }
}

/// Turn a raw SSE byte stream into provider events.
///
/// The sequence ends at `message_stop` or when the body ends, and stops
/// after the first error item.
pub fn decode_event_stream<S, E>(body: S) -> EventStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut buffer = SseLineBuffer::new();
        futures::pin_mut!(body);

        while let Some(chunk) = body.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(StreamError::Transport(e.to_string()));
                    return;
                }
            };

            for line in buffer.feed(&bytes) {
                match decode_line(&line) {
                    Ok(LineOutcome::Event(event)) => yield Ok(event),
                    Ok(LineOutcome::Stop) => return,
                    Ok(LineOutcome::Skip) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        if let Some(line) = buffer.finish() {
            match decode_line(&line) {
                Ok(LineOutcome::Event(event)) => yield Ok(event),
                Ok(_) => {}
                Err(e) => yield Err(e),
            }
        }
    })
}

/// Anthropic streaming client
pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
}

impl AnthropicProvider {
    /// Create a provider sharing the process-wide HTTP client
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.anthropic_api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    #[instrument(skip_all, fields(provider = "anthropic", messages = request.message_count()))]
    async fn stream_chat(&self, request: &ChatRequest, api_key: &str) -> AppResult<EventStream> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: request.messages(),
            stream: true,
        };

        debug!(url = %url, model = MODEL, "Opening upstream stream");

        let response = self
            .client
            .post(&url)
            .headers(build_anthropic_headers(api_key)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "Failed to reach Anthropic");
                e
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after_seconds(response.headers());
            warn!(retry_after = ?retry_after, "Anthropic rate limit hit");
            return Err(AppError::UpstreamRateLimited { retry_after });
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Anthropic error {}: {}",
                status, text
            )));
        }

        Ok(decode_event_stream(response.bytes_stream()))
    }
}
