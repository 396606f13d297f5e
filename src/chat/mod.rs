//! Chat domain types
//!
//! Request-side types for the chat endpoint.

pub mod request;

pub use request::{ChatMessage, ChatRequest, Role};
