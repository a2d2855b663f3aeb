//! # chat-relay - streaming chat relay for OpenAI-compatible providers
//!
//! Accepts a conversation from a client, opens exactly one streaming
//! chat-completion request upstream, and forwards every text delta as soon as
//! it arrives, re-framed as a small normalized event vocabulary.
//!
#![deny(unsafe_code)]

//! ## Event vocabulary
//!
//! Each SSE `data:` payload sent to the client is one of:
//!
//! - `{"content":"..."}`: a text delta
//! - `{"error":"..."}`: the stream failed (terminal)
//! - `{"truncated":true}`: the upstream closed without finishing (terminal)
//! - `[DONE]`: the reply is complete (terminal)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chat_relay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RelayConfig::new("sk-...").with_model("gpt-4o-mini");
//!     let relay = Relay::from_config(&config)?;
//!
//!     let request = ChatRelayRequest::new(vec![ConversationMessage::user("Hello!")]);
//!     let transcript = relay.complete(&request).await?;
//!     println!("{}", transcript.reply().unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! Serving the HTTP endpoint instead:
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), chat_relay::RelayError> {
//! let config = chat_relay::RelayConfig::from_env()?;
//! chat_relay::server::serve(config).await
//! # }
//! ```

pub mod config;
pub mod defaults;
pub mod error;
pub mod relay;
pub mod server;
pub mod streaming;
pub mod telemetry;
pub mod transcript;
pub mod types;
pub mod upstream;

pub use config::{GenerationParams, HttpConfig, RelayConfig, StreamLimits};
pub use error::{ErrorCategory, RelayError};
pub use relay::{Relay, RelayHandle};
pub use streaming::RelayStream;
pub use transcript::{Transcript, TranscriptStatus};
pub use types::{ChatRelayRequest, ConversationMessage, MessageRole, RelayEvent};

/// Common imports
pub mod prelude {
    pub use crate::config::RelayConfig;
    pub use crate::error::RelayError;
    pub use crate::relay::Relay;
    pub use crate::transcript::{Transcript, TranscriptStatus};
    pub use crate::types::{ChatRelayRequest, ConversationMessage, MessageRole, RelayEvent};
    pub use futures::StreamExt;
}
