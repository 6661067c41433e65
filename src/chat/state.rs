//! Chat states, events and effects

use serde::Serialize;

/// Lifecycle of one chat session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatState {
    /// No provider session yet
    Uninitialized,
    /// Session open, waiting for a user message
    Ready,
    /// An assistant reply is streaming into `message_id`
    Streaming { message_id: String },
    /// Provider missing or session creation failed; terminal
    Unavailable { reason: String },
}

/// Events that drive the chat state machine
#[derive(Debug, Clone)]
pub enum ChatEvent {
    SessionStarted,
    SessionFailed {
        reason: String,
    },
    UserMessage {
        text: String,
        user_message_id: String,
        assistant_message_id: String,
    },
    Chunk {
        text: String,
    },
    StreamCompleted,
    StreamFailed {
        message: String,
    },
}

/// Progress reported to the caller of `send_message`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUpdate {
    /// More reply text arrived
    Delta(String),
    /// The reply finished normally
    Done,
    /// The stream broke; the reply was replaced with `apology`
    Failed { apology: String },
}

impl StreamUpdate {
    /// Text carried by this update (empty for `Done`)
    pub fn text(&self) -> &str {
        match self {
            StreamUpdate::Delta(text) => text,
            StreamUpdate::Done => "",
            StreamUpdate::Failed { apology } => apology,
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, StreamUpdate::Delta(_))
    }
}

/// Effects applied by the adapter after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    AppendUserMessage { id: String, text: String },
    OpenAssistantMessage { id: String },
    AppendText { id: String, text: String },
    CloseAssistantMessage { id: String, replacement: Option<String> },
    /// Send `text` to the provider and stream the reply
    RequestStream { text: String },
    Notify(StreamUpdate),
}
