//! Mock provider for testing
//!
//! Replies are scripted up front and handed out in order, one per send.

use crate::llm::{ChatProvider, HistoryTurn, LlmError, ProviderSession, TextStream};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// What the next `send_stream` call produces
#[allow(dead_code)]
pub enum ScriptedReply {
    /// Stream these items, then end
    Stream(Vec<Result<String, LlmError>>),
    /// Fail before any text arrives
    Reject(LlmError),
    /// A stream that never yields
    Hang,
}

impl ScriptedReply {
    pub fn chunks(chunks: &[&str]) -> Self {
        ScriptedReply::Stream(chunks.iter().map(|c| Ok((*c).to_string())).collect())
    }
}

/// Arguments of one `create_session` call
#[derive(Debug, Clone)]
pub struct RecordedSession {
    pub model: String,
    pub history: Vec<HistoryTurn>,
    pub system_instruction: String,
}

pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    sent: Arc<Mutex<Vec<String>>>,
    sessions: Mutex<Vec<RecordedSession>>,
    create_error: Option<LlmError>,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            sessions: Mutex::new(Vec::new()),
            create_error: None,
        }
    }

    /// A provider whose sessions can never be created
    pub fn failing(error: LlmError) -> Self {
        Self {
            create_error: Some(error),
            ..Self::new()
        }
    }

    pub fn queue(&self, reply: ScriptedReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn sessions_created(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn recorded_session(&self, index: usize) -> Option<RecordedSession> {
        self.sessions.lock().unwrap().get(index).cloned()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn create_session(
        &self,
        model: &str,
        history: Vec<HistoryTurn>,
        system_instruction: &str,
    ) -> Result<Box<dyn ProviderSession>, LlmError> {
        self.sessions.lock().unwrap().push(RecordedSession {
            model: model.to_string(),
            history,
            system_instruction: system_instruction.to_string(),
        });

        if let Some(error) = &self.create_error {
            return Err(error.clone());
        }
        Ok(Box::new(MockSession {
            replies: Arc::clone(&self.replies),
            sent: Arc::clone(&self.sent),
        }))
    }
}

struct MockSession {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ProviderSession for MockSession {
    async fn send_stream(&mut self, text: &str) -> Result<TextStream, LlmError> {
        self.sent.lock().unwrap().push(text.to_string());
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(ScriptedReply::Stream(items)) => Ok(futures::stream::iter(items).boxed()),
            Some(ScriptedReply::Reject(error)) => Err(error),
            Some(ScriptedReply::Hang) => Ok(futures::stream::pending().boxed()),
            None => Err(LlmError::network("No mock reply queued")),
        }
    }
}
