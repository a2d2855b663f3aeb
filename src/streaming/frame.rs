//! Upstream frame decoding
//!
//! Turns the payload of one upstream `data:` event into a decision for the
//! relay loop. OpenAI-style chunks look like
//! `{"choices":[{"delta":{"content":"..."}}]}`; failures arrive as
//! `{"error": "..."}` or `{"error": {"message": "..."}}`.

use serde::Deserialize;

use crate::defaults;
use crate::error::RelayError;

/// What one upstream frame means for the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFrame {
    /// Text delta to forward
    Content(String),
    /// Provider-side failure; ends the stream
    Error(String),
    /// Completion sentinel
    Done,
    /// Valid frame with nothing to forward (role-only or finish-only chunks, empty data)
    Skip,
}

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ErrorPayload>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorPayload {
    Message(String),
    Object {
        #[serde(default)]
        message: Option<String>,
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
}

impl ErrorPayload {
    fn into_message(self) -> String {
        match self {
            Self::Message(message) => message,
            Self::Object {
                message: Some(message),
                ..
            } => message,
            Self::Object {
                message: None,
                kind: Some(kind),
            } => kind,
            Self::Object { .. } => "upstream error".to_string(),
        }
    }
}

/// Decode one SSE `data` payload.
///
/// Returns `Err(ParseError)` for payloads that are not valid JSON chunks; the
/// caller decides whether that is fatal.
pub fn decode_frame(data: &str) -> Result<UpstreamFrame, RelayError> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(UpstreamFrame::Skip);
    }
    if data == defaults::upstream::DONE_MARKER {
        return Ok(UpstreamFrame::Done);
    }

    let payload: ChunkPayload = serde_json::from_str(data)
        .map_err(|e| RelayError::ParseError(format!("Failed to parse upstream chunk: {e}")))?;

    if let Some(error) = payload.error {
        return Ok(UpstreamFrame::Error(error.into_message()));
    }

    let content = payload
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.and_then(|delta| delta.content))
        .find(|content| !content.is_empty());

    Ok(content.map_or(UpstreamFrame::Skip, UpstreamFrame::Content))
}
