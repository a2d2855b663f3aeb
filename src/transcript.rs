//! Client-side conversation reducer
//!
//! Folds [`RelayEvent`]s into a conversation, one pure state transition per
//! event:
//!
//! ```rust
//! use chat_relay::transcript::{Transcript, TranscriptStatus};
//! use chat_relay::types::{ConversationMessage, RelayEvent};
//!
//! let transcript = Transcript::new(vec![ConversationMessage::user("hi")])
//!     .apply(&RelayEvent::content("Hel"))
//!     .apply(&RelayEvent::content("lo"))
//!     .apply(&RelayEvent::Done);
//!
//! assert_eq!(transcript.reply(), Some("Hello"));
//! assert_eq!(transcript.status(), &TranscriptStatus::Completed);
//! ```

use crate::types::{ConversationMessage, MessageRole, RelayEvent};

/// Where the reply stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptStatus {
    Streaming,
    Completed,
    Failed(String),
    Truncated,
}

/// Conversation plus the assistant reply being streamed into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ConversationMessage>,
    /// Index of the assistant message this stream writes into
    reply_index: Option<usize>,
    status: TranscriptStatus,
}

impl Transcript {
    pub fn new(history: Vec<ConversationMessage>) -> Self {
        Self {
            messages: history,
            reply_index: None,
            status: TranscriptStatus::Streaming,
        }
    }

    /// Apply one event. Events after a terminal one are ignored.
    pub fn apply(mut self, event: &RelayEvent) -> Self {
        if self.is_finished() {
            return self;
        }

        match event {
            RelayEvent::Content { content } => match self.reply_index {
                Some(index) => self.messages[index].content.push_str(content),
                None => {
                    self.messages
                        .push(ConversationMessage::new(MessageRole::Assistant, content.clone()));
                    self.reply_index = Some(self.messages.len() - 1);
                }
            },
            RelayEvent::Error { error } => self.status = TranscriptStatus::Failed(error.clone()),
            RelayEvent::Truncated => self.status = TranscriptStatus::Truncated,
            RelayEvent::Done => self.status = TranscriptStatus::Completed,
        }
        self
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<ConversationMessage> {
        self.messages
    }

    pub fn status(&self) -> &TranscriptStatus {
        &self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status != TranscriptStatus::Streaming
    }

    /// Text streamed so far, if any arrived.
    pub fn reply(&self) -> Option<&str> {
        self.reply_index
            .map(|index| self.messages[index].content.as_str())
    }
}
