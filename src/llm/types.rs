//! Common types for conversational providers

use super::LlmError;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Speaker of a history turn, in provider terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Model,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Model => "model",
        }
    }
}

/// One prior exchange entry handed to a new session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: MessageRole,
    pub text: String,
}

impl HistoryTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Model,
            text: text.into(),
        }
    }
}

/// Lazy, finite, non-restartable sequence of text deltas.
///
/// The stream ends after the last delta; an `Err` item means the transport
/// failed and no further items follow.
pub type TextStream = BoxStream<'static, Result<String, LlmError>>;
