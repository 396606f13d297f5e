//! Provider event → SSE frame relay
//!
//! A spawned producer task reads provider events and pushes frames into a
//! bounded channel; the response body drains the receiving end. The channel
//! capacity is the only buffer between upstream and the browser, so a slow
//! client suspends the producer on `send` instead of letting frames pile up.

use std::io;
use std::time::Instant as StdInstant;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Duration, Instant};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use super::frame;
use crate::proxy::{EventStream, ProviderEvent, StreamError};
use crate::routes::metrics::record_stream;

/// Message carried by the error frame; details stay in the logs
pub const STREAM_ERROR_MESSAGE: &str = "The reply was interrupted. Please try again.";

/// How long, from the failure, the producer may wait to hand the error frame
/// and the abort signal to a slow client
const ABORT_GRACE: Duration = Duration::from_secs(5);

const DRAIN_POLL: Duration = Duration::from_millis(5);

/// Body items: frames, or an error that makes the server abort the response
pub type FrameStream = ReceiverStream<Result<Bytes, io::Error>>;

/// Lifecycle of one relayed stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Streaming,
    /// Upstream finished; the sentinel frame was sent
    Done,
    /// Upstream failed or the deadline passed; the transport was aborted
    Error,
    /// The client went away; upstream was dropped
    Cancelled,
}

impl RelayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayState::Streaming => "streaming",
            RelayState::Done => "done",
            RelayState::Error => "error",
            RelayState::Cancelled => "cancelled",
        }
    }
}

/// Final report of a relay task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOutcome {
    pub state: RelayState,
    /// Text frames delivered to the channel
    pub frames: usize,
}

#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// Channel capacity in frames (at least 1)
    pub buffer: usize,
    /// Hard end of the exchange
    pub deadline: Instant,
    /// Correlation id for log lines
    pub trace_id: String,
}

enum Step {
    Event(Option<Result<ProviderEvent, StreamError>>),
    Disconnected,
}

enum SendFailure {
    Disconnected,
    DeadlineExceeded,
}

/// Start relaying `events`; returns the frame stream for the response body
/// and a handle resolving to the terminal state.
pub fn spawn(events: EventStream, options: RelayOptions) -> (FrameStream, JoinHandle<RelayOutcome>) {
    let (tx, rx) = mpsc::channel(options.buffer.max(1));
    let handle = tokio::spawn(run(events, tx, options));
    (ReceiverStream::new(rx), handle)
}

async fn send_frame(
    tx: &mpsc::Sender<Result<Bytes, io::Error>>,
    frame: Bytes,
    deadline: Instant,
) -> Result<(), SendFailure> {
    match timeout_at(deadline, tx.send(Ok(frame))).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) => Err(SendFailure::Disconnected),
        Err(_) => Err(SendFailure::DeadlineExceeded),
    }
}

/// Resolves once the body has taken every queued frame or has gone away
async fn drained(tx: &mpsc::Sender<Result<Bytes, io::Error>>) {
    while !tx.is_closed() && tx.capacity() < tx.max_capacity() {
        tokio::time::sleep(DRAIN_POLL).await;
    }
}

async fn run(
    mut events: EventStream,
    tx: mpsc::Sender<Result<Bytes, io::Error>>,
    options: RelayOptions,
) -> RelayOutcome {
    let started = StdInstant::now();
    let deadline = options.deadline;
    let mut state = RelayState::Streaming;
    let mut frames = 0usize;
    let mut failure: Option<StreamError> = None;

    while state == RelayState::Streaming {
        let step = tokio::select! {
            biased;
            _ = tx.closed() => Step::Disconnected,
            next = timeout_at(deadline, events.next()) => match next {
                Ok(item) => Step::Event(item),
                Err(_) => Step::Event(Some(Err(StreamError::DeadlineExceeded))),
            },
        };

        match step {
            Step::Disconnected => state = RelayState::Cancelled,
            Step::Event(Some(Ok(ProviderEvent::TextDelta(text)))) => {
                match send_frame(&tx, frame::text_frame(&text), deadline).await {
                    Ok(()) => frames += 1,
                    Err(SendFailure::Disconnected) => state = RelayState::Cancelled,
                    Err(SendFailure::DeadlineExceeded) => {
                        failure = Some(StreamError::DeadlineExceeded);
                        state = RelayState::Error;
                    }
                }
            }
            Step::Event(Some(Ok(ProviderEvent::Other(kind)))) => {
                debug!(trace_id = %options.trace_id, kind = %kind, "Skipping non-text event");
            }
            Step::Event(Some(Err(e))) => {
                failure = Some(e);
                state = RelayState::Error;
            }
            Step::Event(None) => {
                state = match send_frame(&tx, frame::done_frame(), deadline).await {
                    Ok(()) => RelayState::Done,
                    Err(SendFailure::Disconnected) => RelayState::Cancelled,
                    Err(SendFailure::DeadlineExceeded) => {
                        failure = Some(StreamError::DeadlineExceeded);
                        RelayState::Error
                    }
                };
            }
        }
    }

    // stop reading upstream before anything else; this cancels the request
    drop(events);

    match state {
        RelayState::Error => {
            let reason = failure.map(|e| e.to_string()).unwrap_or_default();
            warn!(
                trace_id = %options.trace_id,
                frames = frames,
                error = %reason,
                "Stream failed after response was committed"
            );
            let grace = Instant::now() + ABORT_GRACE;
            let _ = timeout_at(grace, tx.send(Ok(frame::error_frame(STREAM_ERROR_MESSAGE)))).await;
            // frames still queued would be discarded by the abort
            let _ = timeout_at(grace, drained(&tx)).await;
            let _ = timeout_at(grace, tx.send(Err(io::Error::new(io::ErrorKind::Other, reason)))).await;
        }
        RelayState::Cancelled => {
            info!(
                trace_id = %options.trace_id,
                frames = frames,
                "Client disconnected, upstream request cancelled"
            );
        }
        _ => {
            info!(
                trace_id = %options.trace_id,
                frames = frames,
                elapsed_ms = %started.elapsed().as_millis(),
                "Stream completed"
            );
        }
    }

    record_stream(state.as_str(), frames as u64, started.elapsed().as_secs_f64());

    RelayOutcome { state, frames }
}
