//! SSE decoding adapter
//!
//! Upstream bodies are decoded one line at a time: every complete `data:`
//! line is its own frame, whether the provider separates frames with a blank
//! line or only ends each one with a single newline. [`LineFramed`] cuts the
//! body at line boundaries and closes each `data:` line with a blank line,
//! then `eventsource-stream` parses the result. Text is only handed on in
//! whole lines, so a line or a multi-byte character split across two reads is
//! reassembled first. Comment lines (`: keep-alive`) and fields other than
//! `data` never reach callers as payload. An unterminated last line is
//! flushed when the body ends.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use eventsource_stream::{EventStream, Eventsource};
use futures::{Stream, ready};

/// Extension turning a byte stream into a stream of SSE events.
pub trait SseStreamExt: Sized {
    fn into_sse_stream(self) -> EventStream<LineFramed<Self>>;
}

impl<S, B, E> SseStreamExt for S
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    fn into_sse_stream(self) -> EventStream<LineFramed<Self>> {
        LineFramed::new(self).eventsource()
    }
}

/// Re-chunks a byte stream into whole lines, one `data:` line per event.
#[derive(Debug)]
pub struct LineFramed<S> {
    inner: S,
    buffer: Vec<u8>,
    finished: bool,
}

impl<S> LineFramed<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            finished: false,
        }
    }
}

fn close_line(mut line: Vec<u8>) -> Bytes {
    if line.starts_with(b"data:") {
        line.push(b'\n');
    }
    Bytes::from(line)
}

impl<S, B, E> Stream for LineFramed<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            if let Some(end) = this.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = this.buffer.drain(..=end).collect();
                return Poll::Ready(Some(Ok(close_line(line))));
            }

            if this.finished {
                if this.buffer.is_empty() {
                    return Poll::Ready(None);
                }
                let mut line = std::mem::take(&mut this.buffer);
                line.push(b'\n');
                return Poll::Ready(Some(Ok(close_line(line))));
            }

            match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
                Some(Ok(chunk)) => this.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                None => this.finished = true,
            }
        }
    }
}
