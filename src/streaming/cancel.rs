//! Cancellation utilities
//!
//! First-class cancellation for relay streams held by library callers. The
//! HTTP server does not need this: axum drops the body stream when the client
//! disconnects.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use super::relay_stream::RelayStream;

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The wrapped stream ends without a terminal event
    /// and drops the upstream body, closing the connection so the provider
    /// stops generating.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Make a relay stream cancellable and return its cancel handle.
pub fn make_cancellable_stream(stream: RelayStream) -> (RelayStream, CancelHandle) {
    let handle = CancelHandle::new();
    let token = handle.token.clone();
    let mut inner = stream;
    let s = async_stream::stream! {
        loop {
            // Checked first so a pending upstream read cannot outrun cancellation.
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                item = inner.next() => item,
            };
            match next {
                Some(event) => yield event,
                None => break,
            }
        }
        drop(inner);
        tracing::debug!(cancelled = token.is_cancelled(), "relay stream closed");
    };
    (Box::pin(s), handle)
}
