//! Chat adapter runtime
//!
//! Owns the provider session and transcript, feeds provider output through
//! the state machine, and reports progress to the caller's update callback.

use super::transcript::history_from;
use super::{
    transition, ChatError, ChatEvent, ChatMessage, ChatState, Effect, Sender, StreamUpdate,
    Transcript, TransitionError, APOLOGY_TEXT,
};
use crate::llm::{ChatProvider, LlmError, ProviderSession};
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

const NOT_CONFIGURED: &str = "API key not configured";

/// How a send finished
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// The reply streamed in full
    Completed,
    /// The transport failed; the reply was replaced with an apology and the
    /// session is ready for the next message
    Recovered { error: LlmError },
}

impl From<TransitionError> for ChatError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Unavailable(reason) => ChatError::ProviderUnavailable(reason),
            TransitionError::Busy => ChatError::Busy,
            TransitionError::NotStarted | TransitionError::InvalidTransition(_) => {
                ChatError::InvalidState(err.to_string())
            }
        }
    }
}

/// What the chat widget shows, published after every change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSnapshot {
    pub state: ChatState,
    pub available: bool,
    pub messages: Vec<ChatMessage>,
}

/// One chat session over a remote provider
pub struct ChatAdapter {
    provider: Option<Arc<dyn ChatProvider>>,
    model: String,
    system_instruction: String,
    state: ChatState,
    transcript: Transcript,
    session: Option<Box<dyn ProviderSession>>,
    view: watch::Sender<ChatSnapshot>,
}

impl ChatAdapter {
    /// `provider` is `None` when chat is not configured; the adapter then
    /// becomes unavailable on first use.
    pub fn new(
        provider: Option<Arc<dyn ChatProvider>>,
        model: impl Into<String>,
        system_instruction: impl Into<String>,
    ) -> Self {
        let (view, _) = watch::channel(ChatSnapshot {
            state: ChatState::Uninitialized,
            available: provider.is_some(),
            messages: Vec::new(),
        });
        Self {
            provider,
            model: model.into(),
            system_instruction: system_instruction.into(),
            state: ChatState::Uninitialized,
            transcript: Transcript::new(),
            session: None,
            view,
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Whether sending could ever succeed
    pub fn is_available(&self) -> bool {
        self.provider.is_some() && !matches!(self.state, ChatState::Unavailable { .. })
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            state: self.state.clone(),
            available: self.is_available(),
            messages: self.transcript.messages().to_vec(),
        }
    }

    /// Follow the published snapshot without holding the adapter
    ///
    /// The receiver sees the open reply grow while it streams.
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.view.subscribe()
    }

    fn publish(&self) {
        self.view.send_replace(self.snapshot());
    }

    /// Add a system notice (greeting, status) at the front of the transcript
    pub fn push_greeting(&mut self, text: impl Into<String>) {
        let id = format!("sys-{}", uuid::Uuid::new_v4());
        self.transcript
            .push_front(ChatMessage::new(id, Sender::System, text));
        self.publish();
    }

    /// Drop the provider session and transcript, returning to `Uninitialized`
    pub fn reset(&mut self) {
        self.session = None;
        self.transcript = Transcript::new();
        self.state = ChatState::Uninitialized;
        self.publish();
    }

    /// Open a provider session seeded with `prior_history`
    ///
    /// Prior messages are appended to the transcript; system messages are
    /// not sent to the provider. On a session that is already ready this
    /// does nothing and `prior_history` is discarded.
    pub async fn start_session(&mut self, prior_history: Vec<ChatMessage>) -> Result<(), ChatError> {
        match &self.state {
            ChatState::Uninitialized => {}
            ChatState::Ready => {
                if !prior_history.is_empty() {
                    tracing::debug!(
                        discarded = prior_history.len(),
                        "Session already started, ignoring prior history"
                    );
                }
                return Ok(());
            }
            ChatState::Streaming { .. } => return Err(ChatError::Busy),
            ChatState::Unavailable { reason } => {
                return Err(ChatError::ProviderUnavailable(reason.clone()))
            }
        }

        let history = history_from(&prior_history);
        for mut message in prior_history {
            message.streaming = false;
            self.transcript.push(message);
        }

        let event = match &self.provider {
            None => ChatEvent::SessionFailed {
                reason: NOT_CONFIGURED.to_string(),
            },
            Some(provider) => match provider
                .create_session(&self.model, history, &self.system_instruction)
                .await
            {
                Ok(session) => {
                    self.session = Some(session);
                    ChatEvent::SessionStarted
                }
                Err(e) => {
                    tracing::error!(error = %e, "Error creating chat session");
                    ChatEvent::SessionFailed { reason: e.message }
                }
            },
        };

        self.dispatch(event, &mut |_: StreamUpdate| {})?;
        match &self.state {
            ChatState::Unavailable { reason } => Err(ChatError::ProviderUnavailable(reason.clone())),
            _ => Ok(()),
        }
    }

    /// Send a user message and stream the reply into the transcript
    ///
    /// `on_update` sees every non-empty delta in arrival order, then exactly
    /// one final update. Starts a session first if none is open. A second
    /// send while streaming is rejected with [`ChatError::Busy`].
    pub async fn send_message<F>(&mut self, text: &str, mut on_update: F) -> Result<SendOutcome, ChatError>
    where
        F: FnMut(StreamUpdate) + Send,
    {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self.state == ChatState::Uninitialized {
            self.start_session(Vec::new()).await?;
        }

        let in_flight = InFlight { adapter: self };
        in_flight.run(text, &mut on_update).await
    }

    /// Apply one event; returns the text to stream if the transition asked for it
    fn dispatch(
        &mut self,
        event: ChatEvent,
        on_update: &mut (dyn FnMut(StreamUpdate) + Send),
    ) -> Result<Option<String>, TransitionError> {
        let result = transition(&self.state, event)?;
        self.state = result.new_state;

        let mut request = None;
        for effect in result.effects {
            match effect {
                Effect::AppendUserMessage { id, text } => {
                    self.transcript.push(ChatMessage::new(id, Sender::User, text));
                }
                Effect::OpenAssistantMessage { id } => {
                    self.transcript.open_assistant(&id);
                }
                Effect::AppendText { id, text } => {
                    self.transcript.append_to_open(&id, &text);
                }
                Effect::CloseAssistantMessage { id, replacement } => {
                    self.transcript.close(&id, replacement.as_deref());
                }
                Effect::RequestStream { text } => request = Some(text),
                Effect::Notify(update) => on_update(update),
            }
        }
        self.publish();
        Ok(request)
    }
}

/// Exclusive access to the adapter for one send.
///
/// If the send future is dropped mid-stream the open reply is closed with
/// the apology so the session does not stay busy forever.
struct InFlight<'a> {
    adapter: &'a mut ChatAdapter,
}

impl InFlight<'_> {
    async fn run(
        mut self,
        text: &str,
        on_update: &mut (dyn FnMut(StreamUpdate) + Send),
    ) -> Result<SendOutcome, ChatError> {
        let event = ChatEvent::UserMessage {
            text: text.to_string(),
            user_message_id: format!("msg-{}", uuid::Uuid::new_v4()),
            assistant_message_id: format!("bot-{}", uuid::Uuid::new_v4()),
        };
        let Some(request) = self.adapter.dispatch(event, on_update)? else {
            return Err(ChatError::InvalidState("no stream requested".to_string()));
        };

        let stream = match self.adapter.session.as_mut() {
            Some(session) => session.send_stream(&request).await,
            None => Err(LlmError::unknown("No provider session")),
        };

        let mut stream = match stream {
            Ok(stream) => stream,
            Err(error) => return self.fail(error, on_update),
        };

        while let Some(item) = stream.next().await {
            match item {
                Ok(delta) => {
                    self.adapter.dispatch(ChatEvent::Chunk { text: delta }, on_update)?;
                }
                Err(error) => return self.fail(error, on_update),
            }
        }

        self.adapter.dispatch(ChatEvent::StreamCompleted, on_update)?;
        Ok(SendOutcome::Completed)
    }

    fn fail(
        mut self,
        error: LlmError,
        on_update: &mut (dyn FnMut(StreamUpdate) + Send),
    ) -> Result<SendOutcome, ChatError> {
        tracing::warn!(error = %error, "Chat stream failed, replying with apology");
        self.adapter.dispatch(
            ChatEvent::StreamFailed {
                message: error.message.clone(),
            },
            on_update,
        )?;
        Ok(SendOutcome::Recovered { error })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let ChatState::Streaming { message_id } = &self.adapter.state {
            tracing::warn!(message_id = %message_id, "Chat stream abandoned");
            let message_id = message_id.clone();
            self.adapter.transcript.close(&message_id, Some(APOLOGY_TEXT));
            self.adapter.state = ChatState::Ready;
            self.adapter.publish();
        }
    }
}
