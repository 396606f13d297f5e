//! Chat endpoint
//!
//! `POST /api/chat` validates the conversation, opens an upstream stream and
//! answers with `text/event-stream`. Everything that can fail before the
//! first byte is sent becomes a JSON error response; later failures are the
//! relay's business.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use http_body_util::LengthLimitError;
use tokio::time::{timeout_at, Instant};
use tracing::Instrument;

use crate::{
    chat::ChatRequest,
    error::{AppError, AppResult},
    proxy::RequestContext,
    routes::metrics::record_request,
    streaming::{relay, RelayOptions},
    AppState,
};

/// Largest request body accepted, in bytes
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Handle a chat request
pub async fn chat(
    State(state): State<Arc<AppState>>,
    request: axum::extract::Request,
) -> Result<Response, AppError> {
    let ctx = RequestContext::new(state.chat_provider.name());
    let span = ctx.create_span();

    match start_stream(&state, &ctx, request).instrument(span).await {
        Ok(response) => {
            record_request("streaming");
            Ok(response)
        }
        Err(e) => {
            ctx.log_rejected(&e);
            record_request(e.kind());
            Err(e)
        }
    }
}

async fn read_body(request: axum::extract::Request) -> AppResult<Bytes> {
    axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| {
            let inner = e.into_inner();
            if inner.downcast_ref::<LengthLimitError>().is_some() {
                AppError::PayloadTooLarge {
                    limit: MAX_BODY_BYTES,
                }
            } else {
                AppError::Validation(format!("Failed to read request body: {}", inner))
            }
        })
}

async fn start_stream(
    state: &AppState,
    ctx: &RequestContext,
    request: axum::extract::Request,
) -> AppResult<Response> {
    let deadline = Instant::now() + state.config.request_timeout();

    // no network I/O may happen before this check
    let api_key = state.config.ensure_upstream_configured()?;

    let body = read_body(request).await?;
    let chat_request = ChatRequest::from_body(&body)?;

    ctx.clone()
        .with_messages(chat_request.message_count())
        .log_request_start();

    let events = timeout_at(
        deadline,
        state.chat_provider.stream_chat(&chat_request, api_key),
    )
    .await
    .map_err(|_| AppError::Timeout)??;

    let (frames, _outcome) = relay::spawn(
        events,
        RelayOptions {
            buffer: state.config.stream_buffer,
            deadline,
            trace_id: ctx.trace_id.clone(),
        },
    );

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("X-Accel-Buffering", "no")
        .body(Body::from_stream(frames))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build response: {}", e)))?;

    ctx.log_stream_started();

    Ok(response)
}
