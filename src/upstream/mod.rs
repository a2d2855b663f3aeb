//! Upstream chat-completion providers
//!
//! The relay talks to its upstream through [`UpstreamProvider`], which opens
//! one streaming completion and hands back the raw response body. Decoding
//! lives in [`crate::streaming`], so a provider only deals with transport and
//! with classifying failures that happen before any body byte arrives.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::RelayError;
use crate::types::ConversationMessage;

pub mod errors;
pub mod openai;

pub use errors::classify_http_error;
pub use openai::{OpenAiUpstream, build_http_client};

/// Raw upstream response body, read incrementally.
pub type UpstreamByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, RelayError>> + Send>>;

/// A provider able to open one streaming chat completion.
#[async_trait]
pub trait UpstreamProvider: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &str;

    /// Issue exactly one streaming request for `messages`.
    ///
    /// Returns only once the upstream answered with a success status; any
    /// other outcome is an error and no body is handed out.
    async fn open_stream(
        &self,
        messages: &[ConversationMessage],
    ) -> Result<UpstreamByteStream, RelayError>;
}
