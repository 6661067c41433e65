//! Chat adapter
//!
//! Wraps a [`ChatProvider`](crate::llm::ChatProvider) behind a
//! start-session / send-message contract and keeps the transcript the UI
//! renders. State changes go through the pure [`transition`] function; the
//! [`ChatAdapter`] runtime applies the resulting effects and drives the
//! provider stream.

mod adapter;
mod state;
mod transcript;
mod transition;

#[cfg(test)]
pub mod testing;

pub use adapter::{ChatAdapter, ChatSnapshot, SendOutcome};
pub use state::{ChatEvent, ChatState, Effect, StreamUpdate};
pub use transcript::{ChatMessage, Sender, Transcript};
pub use transition::{transition, TransitionError, TransitionResult};

use thiserror::Error;

/// Shown in place of a reply whose stream failed
pub const APOLOGY_TEXT: &str = "Sorry, I encountered an error. Please try again.";

/// Errors returned to callers of the adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// The provider is unconfigured or the session could not be created.
    /// Terminal for the adapter.
    #[error("Chatbot is not available: {0}")]
    ProviderUnavailable(String),
    /// A reply is still streaming
    #[error("A response is still streaming")]
    Busy,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Invalid chat state: {0}")]
    InvalidState(String),
}
