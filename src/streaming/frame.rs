//! SSE frame encoding for the browser-facing stream
//!
//! Every frame is a single `data: <payload>\n\n` unit:
//! - text delta: `data: {"text":"..."}\n\n`
//! - terminal sentinel: `data: [DONE]\n\n`
//! - mid-stream failure: `data: {"error":"..."}\n\n`

use bytes::Bytes;
use serde::Serialize;

pub const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

#[derive(Serialize)]
struct TextPayload<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    error: &'a str,
}

fn data_frame<T: Serialize>(payload: &T) -> Bytes {
    // a struct of string fields always serializes
    let json = serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string());
    Bytes::from(format!("data: {}\n\n", json))
}

/// Encode one text delta as a frame.
pub fn text_frame(text: &str) -> Bytes {
    data_frame(&TextPayload { text })
}

/// The terminal sentinel frame.
pub fn done_frame() -> Bytes {
    Bytes::from_static(DONE_FRAME)
}

/// Frame sent once before the transport is aborted on a mid-stream failure.
pub fn error_frame(message: &str) -> Bytes {
    data_frame(&ErrorPayload { error: message })
}
