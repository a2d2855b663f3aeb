//! Streaming
//!
//! Upstream SSE decoding and the relay loop that re-frames it for clients.

pub mod cancel;
pub mod frame;
pub mod relay_stream;
pub mod sse;

pub use cancel::{CancelHandle, make_cancellable_stream};
pub use frame::{UpstreamFrame, decode_frame};
pub use relay_stream::{RelayStream, relay_events, relay_events_from_chunks};
pub use sse::{LineFramed, SseStreamExt};
