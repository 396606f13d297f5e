//! Chat relay - streaming bridge between a browser chat widget and an LLM
//!
//! This library provides the core functionality for the relay server: it
//! validates a posted conversation, opens a streaming completion with the
//! upstream provider and re-emits the generated text as server-sent events.

pub mod chat;
pub mod config;
pub mod error;
pub mod proxy;
pub mod routes;
pub mod streaming;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

pub use crate::chat::{ChatMessage, ChatRequest, Role};
pub use crate::config::Config;
pub use crate::error::{AppError, AppResult};
pub use crate::proxy::{AnthropicProvider, ChatProvider};

/// Application state shared across all request handlers
///
/// Built once at startup; holds no per-request mutable state.
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    /// Provider used to open upstream streams; owns the pooled HTTP client
    pub chat_provider: Arc<dyn ChatProvider>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // No overall timeout here: it would cut long replies mid-stream.
        // The per-request deadline lives in the chat handler.
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(32)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let chat_provider: Arc<dyn ChatProvider> =
            Arc::new(AnthropicProvider::new(client, &config));

        Ok(Self {
            config,
            start_time: Instant::now(),
            chat_provider,
        })
    }

    /// Create application state around an injected provider
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(config: Config, chat_provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            chat_provider,
        }
    }
}
