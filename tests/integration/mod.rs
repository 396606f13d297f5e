//! Integration tests for the chat relay
//!
//! These tests drive the real router against a mock provider and verify the
//! complete request/response flow: validation, configuration checks, error
//! classification and the SSE frame protocol.

mod health;
