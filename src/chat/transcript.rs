//! Chat transcript
//!
//! Append-only, except that the single open assistant message grows in place
//! while it streams.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::llm::HistoryTurn;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub streaming: bool,
}

impl ChatMessage {
    pub fn new(id: impl Into<String>, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            streaming: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Insert a message ahead of everything else (greetings)
    pub fn push_front(&mut self, message: ChatMessage) {
        self.messages.insert(0, message);
    }

    /// The assistant message currently streaming, if any
    pub fn open_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.streaming)
    }

    /// Open a new streaming assistant message. Returns false (and does
    /// nothing) if one is already open.
    pub fn open_assistant(&mut self, id: &str) -> bool {
        if self.open_message().is_some() {
            return false;
        }
        let mut message = ChatMessage::new(id, Sender::Assistant, "");
        message.streaming = true;
        self.messages.push(message);
        true
    }

    fn open_mut(&mut self, id: &str) -> Option<&mut ChatMessage> {
        self.messages
            .iter_mut()
            .rev()
            .find(|m| m.streaming && m.id == id)
    }

    pub fn append_to_open(&mut self, id: &str, delta: &str) -> bool {
        match self.open_mut(id) {
            Some(message) => {
                message.text.push_str(delta);
                true
            }
            None => false,
        }
    }

    /// Close the open message, optionally replacing its text
    pub fn close(&mut self, id: &str, replacement: Option<&str>) -> bool {
        match self.open_mut(id) {
            Some(message) => {
                if let Some(text) = replacement {
                    message.text = text.to_string();
                }
                message.streaming = false;
                true
            }
            None => false,
        }
    }
}

/// Provider history for `messages`; system messages are dropped
pub(crate) fn history_from(messages: &[ChatMessage]) -> Vec<HistoryTurn> {
    messages
        .iter()
        .filter_map(|m| match m.sender {
            Sender::User => Some(HistoryTurn::user(m.text.clone())),
            Sender::Assistant => Some(HistoryTurn::model(m.text.clone())),
            Sender::System => None,
        })
        .collect()
}
