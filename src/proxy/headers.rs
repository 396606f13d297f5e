//! Header utilities for provider requests
//!
//! Client headers are never forwarded; every upstream request carries only
//! the headers built here.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, RETRY_AFTER};

use crate::error::{AppError, AppResult};

/// Anthropic API version sent with every request
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Build the header set for a streaming Anthropic request
pub fn build_anthropic_headers(api_key: &str) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();

    let mut key = HeaderValue::from_str(api_key).map_err(|_| AppError::Configuration)?;
    key.set_sensitive(true);
    headers.insert("x-api-key", key);
    headers.insert(
        "anthropic-version",
        HeaderValue::from_static(ANTHROPIC_VERSION),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

    Ok(headers)
}

/// Parse a `Retry-After` header given in whole seconds
pub fn retry_after_seconds(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
