//! Stream relay
//!
//! One request moves through `Validating → Connecting → Streaming` and ends
//! `Completed`, `Errored` or `Truncated`. Validation and connection failures
//! come back as `Err` before any event exists; everything after that is
//! reported inside the returned [`RelayStream`].

use std::sync::Arc;

use futures_util::StreamExt;
use uuid::Uuid;

use crate::config::{RelayConfig, StreamLimits};
use crate::error::RelayError;
use crate::streaming::{CancelHandle, RelayStream, make_cancellable_stream, relay_events};
use crate::transcript::Transcript;
use crate::types::ChatRelayRequest;
use crate::upstream::{OpenAiUpstream, UpstreamProvider};

/// A relay stream together with its cancel handle.
pub struct RelayHandle {
    pub stream: RelayStream,
    pub cancel: CancelHandle,
}

/// Bridges client chat requests to one upstream provider.
#[derive(Clone)]
pub struct Relay {
    upstream: Arc<dyn UpstreamProvider>,
    limits: StreamLimits,
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("upstream", &self.upstream.name())
            .field("limits", &self.limits)
            .finish()
    }
}

impl Relay {
    pub fn new(upstream: Arc<dyn UpstreamProvider>, limits: StreamLimits) -> Self {
        Self { upstream, limits }
    }

    /// Build a relay backed by the OpenAI-compatible upstream in `config`.
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        let upstream = OpenAiUpstream::new(config)?;
        Ok(Self::new(Arc::new(upstream), config.limits))
    }

    pub fn limits(&self) -> StreamLimits {
        self.limits
    }

    /// Validate `request`, open the upstream stream and start relaying.
    ///
    /// Returns once the upstream has answered with a success status; deltas
    /// are forwarded as they arrive, nothing is buffered.
    pub async fn open(&self, request: &ChatRelayRequest) -> Result<RelayStream, RelayError> {
        let request_id = Uuid::new_v4().to_string();

        request.validate_shape()?;

        tracing::info!(
            request_id = %request_id,
            provider = self.upstream.name(),
            messages = request.messages.len(),
            "opening upstream stream"
        );

        let opened = tokio::time::timeout(
            self.limits.idle_timeout,
            self.upstream.open_stream(&request.messages),
        )
        .await;

        let body = match opened {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                tracing::debug!(request_id = %request_id, error = %e, "upstream stream not opened");
                return Err(e);
            }
            Err(_) => {
                return Err(RelayError::TimeoutError(format!(
                    "upstream did not respond within {:?}",
                    self.limits.idle_timeout
                )));
            }
        };

        Ok(relay_events(body, self.limits, request_id))
    }

    /// Like [`Relay::open`], with a handle to stop the stream early.
    pub async fn open_with_cancel(
        &self,
        request: &ChatRelayRequest,
    ) -> Result<RelayHandle, RelayError> {
        let stream = self.open(request).await?;
        let (stream, cancel) = make_cancellable_stream(stream);
        Ok(RelayHandle { stream, cancel })
    }

    /// Run the relay to completion and fold every event into a transcript.
    pub async fn complete(&self, request: &ChatRelayRequest) -> Result<Transcript, RelayError> {
        let stream = self.open(request).await?;
        let transcript = stream
            .fold(
                Transcript::new(request.messages.clone()),
                |transcript, event| async move { transcript.apply(&event) },
            )
            .await;
        Ok(transcript)
    }
}
