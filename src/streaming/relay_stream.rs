//! The relay decode loop
//!
//! Reads the upstream body, decodes frames and yields [`RelayEvent`]s in
//! upstream order. Every stream that runs to its end yields exactly one
//! terminal event (`Done`, `Error` or `Truncated`). A stream dropped early by
//! its consumer yields none, and dropping it drops the upstream body, which
//! releases the connection.

use std::pin::Pin;

use eventsource_stream::EventStreamError;
use futures::Stream;
use futures_util::StreamExt;
use tokio::time::Instant;

use super::frame::{UpstreamFrame, decode_frame};
use super::sse::SseStreamExt;
use crate::config::StreamLimits;
use crate::error::RelayError;
use crate::types::RelayEvent;
use crate::upstream::UpstreamByteStream;

/// Stream of events re-emitted to the client
pub type RelayStream = Pin<Box<dyn Stream<Item = RelayEvent> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Errored,
    Truncated,
}

/// Logs how a relayed stream ended, including abandonment by the client.
struct StreamGuard {
    request_id: String,
    relayed: usize,
    outcome: Option<Outcome>,
}

impl StreamGuard {
    fn new(request_id: String) -> Self {
        Self {
            request_id,
            relayed: 0,
            outcome: None,
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        match self.outcome {
            Some(outcome) => tracing::info!(
                request_id = %self.request_id,
                deltas = self.relayed,
                ?outcome,
                "relay stream finished"
            ),
            None => tracing::debug!(
                request_id = %self.request_id,
                deltas = self.relayed,
                "client went away before the stream finished; upstream connection released"
            ),
        }
    }
}

/// Relay an upstream SSE body as a normalized event stream.
pub fn relay_events(
    upstream: UpstreamByteStream,
    limits: StreamLimits,
    request_id: String,
) -> RelayStream {
    let stream = async_stream::stream! {
        let mut guard = StreamGuard::new(request_id);
        let deadline = Instant::now() + limits.max_duration;
        let mut frames = Box::pin(upstream.into_sse_stream());

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let idle = remaining >= limits.idle_timeout;
            let wait = if idle { limits.idle_timeout } else { remaining };

            let next = match tokio::time::timeout(wait, frames.next()).await {
                Ok(next) => next,
                Err(_) => {
                    let message = if idle {
                        format!("upstream stream idle for more than {:?}", limits.idle_timeout)
                    } else {
                        format!("upstream stream exceeded {:?}", limits.max_duration)
                    };
                    tracing::warn!(request_id = %guard.request_id, "{message}");
                    guard.finish(Outcome::Errored);
                    yield RelayEvent::error(message);
                    break;
                }
            };

            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(EventStreamError::Transport(e))) => {
                    tracing::warn!(request_id = %guard.request_id, error = %e, "upstream stream failed");
                    guard.finish(Outcome::Errored);
                    yield RelayEvent::error(e.user_message());
                    break;
                }
                Some(Err(e)) => {
                    tracing::warn!(request_id = %guard.request_id, error = %e, "skipping undecodable upstream bytes");
                    continue;
                }
                None => {
                    tracing::warn!(request_id = %guard.request_id, "upstream closed without completion marker");
                    guard.finish(Outcome::Truncated);
                    yield RelayEvent::Truncated;
                    break;
                }
            };

            match decode_frame(&event.data) {
                Ok(UpstreamFrame::Content(content)) => {
                    guard.relayed += 1;
                    yield RelayEvent::content(content);
                }
                Ok(UpstreamFrame::Skip) => {}
                Ok(UpstreamFrame::Done) => {
                    guard.finish(Outcome::Completed);
                    yield RelayEvent::Done;
                    break;
                }
                Ok(UpstreamFrame::Error(message)) => {
                    tracing::warn!(request_id = %guard.request_id, error = %message, "upstream reported an error mid-stream");
                    guard.finish(Outcome::Errored);
                    yield RelayEvent::error(message);
                    break;
                }
                Err(e) => {
                    tracing::warn!(request_id = %guard.request_id, error = %e, data = %event.data, "skipping malformed upstream frame");
                }
            }
        }
    };

    Box::pin(stream)
}

/// Convenience for tests and library callers holding raw body chunks.
pub fn relay_events_from_chunks<I, B>(chunks: I, limits: StreamLimits) -> RelayStream
where
    I: IntoIterator<Item = B>,
    B: Into<bytes::Bytes>,
{
    let body = futures_util::stream::iter(
        chunks
            .into_iter()
            .map(|chunk| Ok::<_, RelayError>(chunk.into()))
            .collect::<Vec<_>>(),
    );
    relay_events(Box::pin(body), limits, "local".to_string())
}
