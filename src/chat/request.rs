//! Inbound chat request types and validation
//!
//! The browser posts `{ "messages": [ { "role", "content" }, ... ] }`.
//! [`ChatRequest::from_body`] is the only way to build a request from
//! untrusted input: it either yields a typed, ordered conversation or an
//! [`AppError::Validation`] carrying a message for the client.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Who authored a message in the conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single conversation turn
///
/// `role` must be one of the two enumerated values and `content` must be a
/// string. Unknown fields on an element are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    role: Role,
    content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// An ordered conversation; index order is conversational order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Build a request from already-typed messages.
    ///
    /// Rejects an empty conversation, same as [`ChatRequest::from_body`].
    pub fn new(messages: Vec<ChatMessage>) -> AppResult<Self> {
        if messages.is_empty() {
            return Err(AppError::Validation(
                "messages must not be empty".to_string(),
            ));
        }
        Ok(Self { messages })
    }

    /// Validate a raw request body.
    pub fn from_body(body: &[u8]) -> AppResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e)))?;

        let items = value
            .get("messages")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| AppError::Validation("messages must be an array".to_string()))?;

        let messages = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                ChatMessage::deserialize(item)
                    .map_err(|e| AppError::Validation(format!("messages[{}]: {}", index, e)))
            })
            .collect::<AppResult<Vec<_>>>()?;

        Self::new(messages)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of turns; never zero
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}
