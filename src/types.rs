//! Relay domain types
//!
//! Everything here is transient: built per request and dropped once the
//! response has been written.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::defaults;
use crate::error::RelayError;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One entry of the caller-supplied conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

fn default_stream() -> bool {
    true
}

/// Inbound request body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatRelayRequest {
    /// Ordered conversation history
    #[validate(length(min = 1, message = "messages must not be empty"))]
    pub messages: Vec<ConversationMessage>,

    /// Stream the answer as SSE (`true`) or return it as one JSON body
    #[serde(default = "default_stream")]
    pub stream: bool,
}

impl ChatRelayRequest {
    pub fn new(messages: Vec<ConversationMessage>) -> Self {
        Self {
            messages,
            stream: true,
        }
    }

    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Structural validation. Roles and content types are already enforced by
    /// deserialization; this catches what serde cannot.
    pub fn validate_shape(&self) -> Result<(), RelayError> {
        self.validate().map_err(|errors| {
            let message = errors
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .next()
                .unwrap_or_else(|| errors.to_string());
            RelayError::InvalidInput(message)
        })
    }
}

/// Event re-emitted to the client, one per SSE `data:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// Incremental text delta
    Content { content: String },
    /// Terminal failure after the stream was opened
    Error { error: String },
    /// Upstream closed without signalling completion
    Truncated,
    /// Normal completion sentinel
    Done,
}

impl RelayEvent {
    pub fn content(content: impl Into<String>) -> Self {
        Self::Content {
            content: content.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Content { .. })
    }

    /// Payload written after `data: ` on the wire.
    pub fn to_data(&self) -> String {
        match self {
            Self::Content { content } => serde_json::json!({ "content": content }).to_string(),
            Self::Error { error } => serde_json::json!({ "error": error }).to_string(),
            Self::Truncated => serde_json::json!({ "truncated": true }).to_string(),
            Self::Done => defaults::upstream::DONE_MARKER.to_string(),
        }
    }

    /// Inverse of [`RelayEvent::to_data`], for consumers of the relay stream.
    pub fn from_data(data: &str) -> Result<Self, RelayError> {
        let data = data.trim();
        if data == defaults::upstream::DONE_MARKER {
            return Ok(Self::Done);
        }
        let value: serde_json::Value = serde_json::from_str(data)?;
        if let Some(content) = value.get("content").and_then(|v| v.as_str()) {
            return Ok(Self::content(content));
        }
        if let Some(error) = value.get("error").and_then(|v| v.as_str()) {
            return Ok(Self::error(error));
        }
        if value.get("truncated").and_then(|v| v.as_bool()) == Some(true) {
            return Ok(Self::Truncated);
        }
        Err(RelayError::ParseError(format!(
            "unrecognized relay event: {data}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_to_streaming() {
        let req: ChatRelayRequest =
            serde_json::from_str(r#"{"messages":[{"role":"user","content":"hi"}]}"#).unwrap();
        assert!(req.stream);
        assert_eq!(req.messages, vec![ConversationMessage::user("hi")]);
    }

    #[test]
    fn unknown_role_fails_deserialization() {
        let res = serde_json::from_str::<ChatRelayRequest>(
            r#"{"messages":[{"role":"tool","content":"hi"}],"stream":true}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn non_text_content_fails_deserialization() {
        let res = serde_json::from_str::<ChatRelayRequest>(
            r#"{"messages":[{"role":"user","content":42}],"stream":true}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn empty_messages_fail_validation() {
        let err = ChatRelayRequest::new(vec![]).validate_shape().unwrap_err();
        match err {
            RelayError::InvalidInput(msg) => assert_eq!(msg, "messages must not be empty"),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn wire_format_matches_client_contract() {
        assert_eq!(RelayEvent::content("Hi").to_data(), r#"{"content":"Hi"}"#);
        assert_eq!(
            RelayEvent::error("quota exceeded").to_data(),
            r#"{"error":"quota exceeded"}"#
        );
        assert_eq!(RelayEvent::Truncated.to_data(), r#"{"truncated":true}"#);
        assert_eq!(RelayEvent::Done.to_data(), "[DONE]");
    }

    #[test]
    fn from_data_reads_every_event_kind() {
        for event in [
            RelayEvent::content("a \"quoted\"\nline"),
            RelayEvent::error("boom"),
            RelayEvent::Truncated,
            RelayEvent::Done,
        ] {
            assert_eq!(RelayEvent::from_data(&event.to_data()).unwrap(), event);
        }
        assert!(RelayEvent::from_data(r#"{"other":1}"#).is_err());
    }

    #[test]
    fn only_content_is_non_terminal() {
        assert!(!RelayEvent::content("x").is_terminal());
        assert!(RelayEvent::error("x").is_terminal());
        assert!(RelayEvent::Truncated.is_terminal());
        assert!(RelayEvent::Done.is_terminal());
    }
}
