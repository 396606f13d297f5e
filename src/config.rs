//! Configuration management for the chat relay
//!
//! Configuration is loaded from environment variables once at startup.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Value shipped in `.env.example`; treated the same as a missing key.
pub const PLACEHOLDER_API_KEY: &str = "your_anthropic_api_key_here";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Anthropic API base URL (without the `/v1` suffix)
    pub anthropic_api_url: String,
    /// Anthropic API key. Checked per request, not at startup.
    pub anthropic_api_key: Option<String>,

    /// Deadline for a whole chat exchange, upstream call and stream included
    pub request_timeout_seconds: u64,
    /// Capacity of the frame channel between upstream reader and response body
    pub stream_buffer: usize,

    /// Allowed CORS origin; any origin when unset
    pub allowed_origin: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("RELAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("RELAY_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid RELAY_PORT")?,

            anthropic_api_url: env::var("ANTHROPIC_API_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok(),

            request_timeout_seconds: env::var("RELAY_REQUEST_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .context("Invalid RELAY_REQUEST_TIMEOUT_SECONDS")?,
            stream_buffer: env::var("RELAY_STREAM_BUFFER")
                .unwrap_or_else(|_| "16".to_string())
                .parse::<usize>()
                .context("Invalid RELAY_STREAM_BUFFER")?
                .max(1),

            allowed_origin: env::var("RELAY_ALLOWED_ORIGIN")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        })
    }

    /// Per-request deadline as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Return the upstream API key, or fail before any network I/O happens.
    ///
    /// A key that is missing, blank, or still the placeholder value is
    /// rejected with [`AppError::Configuration`].
    pub fn ensure_upstream_configured(&self) -> AppResult<&str> {
        match self.anthropic_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() && key != PLACEHOLDER_API_KEY => Ok(key),
            _ => Err(AppError::Configuration),
        }
    }

    /// Whether [`Config::ensure_upstream_configured`] would succeed
    pub fn is_upstream_configured(&self) -> bool {
        self.ensure_upstream_configured().is_ok()
    }
}
