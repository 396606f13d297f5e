//! Proxy module
//!
//! Handles request forwarding to the upstream chat provider.

pub mod anthropic;
pub mod headers;
pub mod logging;
pub mod provider;

pub use anthropic::AnthropicProvider;
pub use logging::RequestContext;
pub use provider::{ChatProvider, EventStream, ProviderEvent, StreamError};
