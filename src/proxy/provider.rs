//! Chat provider abstraction layer
//!
//! Defines the trait interface for streaming completion providers so the
//! route handler never depends on a concrete backend.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

use crate::chat::ChatRequest;
use crate::error::AppResult;

/// One decoded event from the provider's stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Incremental reply text
    TextDelta(String),
    /// Any other event; carries the provider's event type for logging
    Other(String),
}

/// Failures raised while iterating an already-open provider stream
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StreamError {
    /// Transport failed while reading the response body
    #[error("Stream transport error: {0}")]
    Transport(String),

    /// Provider sent an `error` event
    #[error("Provider error ({kind}): {message}")]
    Provider { kind: String, message: String },

    /// A `data:` payload could not be decoded
    #[error("Failed to parse provider event: {0}")]
    Parse(String),

    /// The per-request deadline passed before the provider finished
    #[error("Stream deadline exceeded")]
    DeadlineExceeded,
}

/// Lazy, single-pass sequence of provider events.
///
/// Dropping the stream cancels the underlying upstream request.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ProviderEvent, StreamError>> + Send>>;

/// Trait defining the interface for streaming chat providers
///
/// `stream_chat` returns `Err` only for failures that happen before any
/// event is produced (connect errors, authentication, rate limiting). Once
/// it returns `Ok`, later failures arrive as `Err` items of the stream.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Get the provider name for logging and metrics
    fn name(&self) -> &'static str;

    /// Open a streaming completion for the conversation.
    async fn stream_chat(&self, request: &ChatRequest, api_key: &str) -> AppResult<EventStream>;
}
