//! Conversational provider abstraction
//!
//! The chat adapter only sees [`ChatProvider`] and [`ProviderSession`]; the
//! transport behind them is an external dependency.

mod config;
mod error;
mod gemini;
mod types;

pub use config::{build_provider, LlmConfig};
pub use error::{LlmError, LlmErrorKind};
pub use gemini::GeminiProvider;
pub use types::*;

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A remote conversational service
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Open a stateful conversation seeded with `history`
    async fn create_session(
        &self,
        model: &str,
        history: Vec<HistoryTurn>,
        system_instruction: &str,
    ) -> Result<Box<dyn ProviderSession>, LlmError>;
}

/// One open conversation with a provider
#[async_trait]
pub trait ProviderSession: Send {
    /// Send a user message and stream back the reply
    async fn send_stream(&mut self, text: &str) -> Result<TextStream, LlmError>;
}

/// Logging wrapper for chat providers
pub struct LoggingProvider {
    inner: Arc<dyn ChatProvider>,
}

impl LoggingProvider {
    pub fn new(inner: Arc<dyn ChatProvider>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ChatProvider for LoggingProvider {
    async fn create_session(
        &self,
        model: &str,
        history: Vec<HistoryTurn>,
        system_instruction: &str,
    ) -> Result<Box<dyn ProviderSession>, LlmError> {
        let history_len = history.len();
        match self
            .inner
            .create_session(model, history, system_instruction)
            .await
        {
            Ok(session) => {
                tracing::info!(model = %model, history_len, "Chat session created");
                Ok(Box::new(LoggingSession {
                    inner: session,
                    model: model.to_string(),
                }))
            }
            Err(e) => {
                tracing::error!(model = %model, error = %e.message, "Chat session creation failed");
                Err(e)
            }
        }
    }
}

struct LoggingSession {
    inner: Box<dyn ProviderSession>,
    model: String,
}

#[async_trait]
impl ProviderSession for LoggingSession {
    async fn send_stream(&mut self, text: &str) -> Result<TextStream, LlmError> {
        let start = Instant::now();
        let model = self.model.clone();

        let stream = self.inner.send_stream(text).await.map_err(|e| {
            tracing::error!(
                model = %model,
                error = %e.message,
                transient = e.kind.is_transient(),
                "Chat stream request failed"
            );
            e
        })?;

        let chunks = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicBool::new(false));
        let counted = {
            let chunks = Arc::clone(&chunks);
            let failed = Arc::clone(&failed);
            let model = model.clone();
            stream.inspect(move |item| match item {
                Ok(_) => {
                    chunks.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    failed.store(true, Ordering::Relaxed);
                    tracing::error!(
                        model = %model,
                        duration_ms = %start.elapsed().as_millis(),
                        error = %e.message,
                        "Chat stream failed"
                    );
                }
            })
        };
        let finished = futures::stream::once(async move {
            if !failed.load(Ordering::Relaxed) {
                tracing::info!(
                    model = %model,
                    duration_ms = %start.elapsed().as_millis(),
                    chunks = chunks.load(Ordering::Relaxed),
                    "Chat stream completed"
                );
            }
            None::<Result<String, LlmError>>
        })
        .filter_map(futures::future::ready);

        Ok(counted.chain(finished).boxed())
    }
}
