//! Pure chat state transitions
//!
//! Given the same state and event this always yields the same result; all
//! I/O happens in the adapter.

use super::{ChatEvent, ChatState, Effect, StreamUpdate, APOLOGY_TEXT};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Events the current state cannot accept
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Chat is unavailable: {0}")]
    Unavailable(String),
    #[error("Chat session has not been started")]
    NotStarted,
    #[error("A response is still streaming")]
    Busy,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub fn transition(state: &ChatState, event: ChatEvent) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Unavailable is terminal
        (ChatState::Unavailable { reason }, _) => Err(TransitionError::Unavailable(reason.clone())),

        // Session setup
        (ChatState::Uninitialized, ChatEvent::SessionStarted) => {
            Ok(TransitionResult::new(ChatState::Ready))
        }
        (ChatState::Uninitialized, ChatEvent::SessionFailed { reason }) => {
            Ok(TransitionResult::new(ChatState::Unavailable { reason }))
        }
        (ChatState::Ready, ChatEvent::SessionStarted) => Ok(TransitionResult::new(ChatState::Ready)),

        // Sending
        (ChatState::Uninitialized, ChatEvent::UserMessage { .. }) => Err(TransitionError::NotStarted),
        (
            ChatState::Ready,
            ChatEvent::UserMessage {
                text,
                user_message_id,
                assistant_message_id,
            },
        ) => Ok(TransitionResult::new(ChatState::Streaming {
            message_id: assistant_message_id.clone(),
        })
        .with_effect(Effect::AppendUserMessage {
            id: user_message_id,
            text: text.clone(),
        })
        .with_effect(Effect::OpenAssistantMessage {
            id: assistant_message_id,
        })
        .with_effect(Effect::RequestStream { text })),
        (ChatState::Streaming { .. }, ChatEvent::UserMessage { .. }) => Err(TransitionError::Busy),

        // Streaming
        (ChatState::Streaming { .. }, ChatEvent::Chunk { text }) if text.is_empty() => {
            Ok(TransitionResult::new(state.clone()))
        }
        (ChatState::Streaming { message_id }, ChatEvent::Chunk { text }) => {
            Ok(TransitionResult::new(state.clone())
                .with_effect(Effect::AppendText {
                    id: message_id.clone(),
                    text: text.clone(),
                })
                .with_effect(Effect::Notify(StreamUpdate::Delta(text))))
        }
        (ChatState::Streaming { message_id }, ChatEvent::StreamCompleted) => {
            Ok(TransitionResult::new(ChatState::Ready)
                .with_effect(Effect::CloseAssistantMessage {
                    id: message_id.clone(),
                    replacement: None,
                })
                .with_effect(Effect::Notify(StreamUpdate::Done)))
        }
        // Transport failures are recovered: the reply becomes an apology and
        // the session stays usable.
        (ChatState::Streaming { message_id }, ChatEvent::StreamFailed { .. }) => {
            Ok(TransitionResult::new(ChatState::Ready)
                .with_effect(Effect::CloseAssistantMessage {
                    id: message_id.clone(),
                    replacement: Some(APOLOGY_TEXT.to_string()),
                })
                .with_effect(Effect::Notify(StreamUpdate::Failed {
                    apology: APOLOGY_TEXT.to_string(),
                })))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in state {state:?}"
        ))),
    }
}
