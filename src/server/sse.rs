//! SSE encoding of relay streams for axum

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;

use crate::config::RelayConfig;
use crate::defaults;
use crate::streaming::RelayStream;
use crate::types::RelayEvent;

/// Options for SSE encoding.
#[derive(Debug, Clone)]
pub struct SseOptions {
    /// Interval of `:` keep-alive comments. `None` sends none.
    pub keep_alive: Option<Duration>,

    /// Whether to mask error messages.
    ///
    /// When `true`, in-stream error text is replaced by `masked_error_message`
    /// (or "internal error").
    pub mask_errors: bool,

    /// Custom error message to use when `mask_errors` is `true`.
    pub masked_error_message: Option<String>,
}

impl Default for SseOptions {
    fn default() -> Self {
        Self {
            keep_alive: Some(defaults::stream::KEEP_ALIVE),
            mask_errors: false,
            masked_error_message: None,
        }
    }
}

impl SseOptions {
    /// Upstream error text passed through to the client.
    pub fn development() -> Self {
        Self::default()
    }

    /// Errors masked.
    pub fn production() -> Self {
        Self {
            mask_errors: true,
            ..Default::default()
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            keep_alive: config.keep_alive,
            mask_errors: config.mask_errors,
            masked_error_message: None,
        }
    }

    /// Error text as the client should see it.
    pub fn error_text(&self, error: &str) -> String {
        if self.mask_errors {
            self.masked_error_message
                .clone()
                .unwrap_or_else(|| defaults::server::MASKED_ERROR_MESSAGE.to_string())
        } else {
            error.to_string()
        }
    }

    /// Apply masking to one event.
    pub fn prepare(&self, event: RelayEvent) -> RelayEvent {
        match event {
            RelayEvent::Error { error } => RelayEvent::error(self.error_text(&error)),
            other => other,
        }
    }
}

/// Convert a relay stream into an axum SSE response: one `data:` line per event.
pub fn to_sse_response(stream: RelayStream, opts: SseOptions) -> Response {
    let keep_alive = opts.keep_alive;
    let events = stream.map(move |event| {
        Ok::<_, Infallible>(Event::default().data(opts.prepare(event).to_data()))
    });

    let sse = Sse::new(events);
    match keep_alive {
        Some(interval) => sse
            .keep_alive(KeepAlive::new().interval(interval))
            .into_response(),
        None => sse.into_response(),
    }
}
