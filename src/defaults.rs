//! Default Configuration Values
//!
//! Centralizes the defaults used by `RelayConfig` and the server.

use std::time::Duration;

/// Upstream provider defaults
pub mod upstream {
    /// OpenAI-compatible API root; `/chat/completions` is appended.
    pub const BASE_URL: &str = "https://api.openai.com/v1";

    /// Model requested from the upstream provider
    pub const MODEL: &str = "gpt-4o-mini";

    /// Path of the streaming completion endpoint, relative to `BASE_URL`
    pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

    /// Payload value that marks normal completion of an upstream stream
    pub const DONE_MARKER: &str = "[DONE]";
}

/// Fixed generation parameters. Callers cannot override these per request.
pub mod generation {
    pub const TEMPERATURE: f32 = 0.7;
    pub const MAX_TOKENS: u32 = 1024;
    pub const TOP_P: f32 = 1.0;
}

/// HTTP client defaults
pub mod http {
    use super::*;

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// User-Agent sent upstream
    pub const USER_AGENT: &str = concat!("chat-relay/", env!("CARGO_PKG_VERSION"));
}

/// Stream lifetime limits
pub mod stream {
    use super::*;

    /// Longest silence tolerated between upstream frames (also bounds the
    /// wait for the upstream response head).
    pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Wall-clock cap for a single relayed stream
    pub const MAX_DURATION: Duration = Duration::from_secs(600);

    /// Interval of SSE keep-alive comments sent to the client
    pub const KEEP_ALIVE: Duration = Duration::from_secs(15);
}

/// Server defaults
pub mod server {
    pub const BIND_ADDR: &str = "127.0.0.1:3000";

    /// Error text used in place of upstream messages when masking is on
    pub const MASKED_ERROR_MESSAGE: &str = "internal error";
}
