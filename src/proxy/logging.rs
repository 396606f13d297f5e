//! Request logging for relayed chats
//!
//! Gives each chat request a short correlation id so the handler's log
//! lines and the relay task's log lines can be joined.

use std::time::Instant;
use tracing::{info, warn, Span};
use uuid::Uuid;

use crate::error::AppError;

/// Context for tracking a chat request through the system
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Short identifier for log correlation
    pub trace_id: String,
    /// When the request started
    pub start_time: Instant,
    /// Provider handling this request
    pub provider: &'static str,
    /// Number of messages in the forwarded conversation
    pub messages: Option<usize>,
}

impl RequestContext {
    pub fn new(provider: &'static str) -> Self {
        Self {
            trace_id: Uuid::new_v4().simple().to_string()[..8].to_string(),
            start_time: Instant::now(),
            provider,
            messages: None,
        }
    }

    pub fn with_messages(mut self, count: usize) -> Self {
        self.messages = Some(count);
        self
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    pub fn log_request_start(&self) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            messages = ?self.messages,
            "Chat request started"
        );
    }

    pub fn log_stream_started(&self) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            elapsed_ms = %self.elapsed_ms(),
            "Streaming response started"
        );
    }

    /// Log a failure that was turned into an error response.
    ///
    /// Server-side failures are also logged by the error response itself;
    /// this line adds the correlation id and timing.
    pub fn log_rejected(&self, error: &AppError) {
        warn!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            kind = error.kind(),
            status = error.status_code().as_u16(),
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Chat request rejected before streaming"
        );
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "chat_request",
            trace_id = %self.trace_id,
            provider = %self.provider,
        )
    }
}
