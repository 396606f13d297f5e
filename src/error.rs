//! Error types for the chat relay
//!
//! `AppError` covers every failure that can happen before a chat response
//! starts streaming. Its `IntoResponse` impl is the error classifier: each
//! variant maps to one HTTP status and a `{ "error": string }` body.

use axum::{
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Advisory returned to the browser when the provider rate-limits us
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests. Please wait a moment and try again.";

/// Returned when the upstream credential is missing or a placeholder
pub const NOT_CONFIGURED_MESSAGE: &str = "Chat service is not configured";

/// Returned for every failure whose details stay in the logs
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to process chat request";

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Upstream API key is missing or a placeholder")]
    Configuration,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Upstream rate limit exceeded")]
    UpstreamRateLimited { retry_after: Option<u64> },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream request timed out")]
    Timeout,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UpstreamRateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Configuration
            | AppError::Upstream(_)
            | AppError::Timeout
            | AppError::Http(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label used for the `outcome` metric and log lines
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Configuration => "not_configured",
            AppError::Validation(_) => "invalid_request",
            AppError::PayloadTooLarge { .. } => "payload_too_large",
            AppError::UpstreamRateLimited { .. } => "rate_limited",
            AppError::Upstream(_) | AppError::Http(_) => "upstream_error",
            AppError::Timeout => "timeout",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show the browser
    fn public_message(&self) -> String {
        match self {
            AppError::Configuration => NOT_CONFIGURED_MESSAGE.to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::PayloadTooLarge { .. } => self.to_string(),
            AppError::UpstreamRateLimited { .. } => RATE_LIMIT_MESSAGE.to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(kind = self.kind(), error = %self, "Chat request failed");
        }

        let mut headers = HeaderMap::new();
        if let AppError::UpstreamRateLimited {
            retry_after: Some(seconds),
        } = &self
        {
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                headers.insert(RETRY_AFTER, value);
            }
        }

        let body = ErrorResponse {
            error: self.public_message(),
        };

        (status, headers, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
