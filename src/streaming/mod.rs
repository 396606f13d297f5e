//! SSE (Server-Sent Events) streaming
//!
//! - `line_buffer`: reassembles upstream SSE lines across chunk boundaries
//! - `frame`: encodes the frames sent to the browser
//! - `relay`: the producer/consumer pipeline between the two

pub mod frame;
pub mod line_buffer;
pub mod relay;

pub use line_buffer::SseLineBuffer;
pub use relay::{FrameStream, RelayOptions, RelayOutcome, RelayState};
