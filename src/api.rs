//! HTTP API for the MindSetu dashboards
//!
//! The view layer as JSON endpoints plus an SSE stream for chat replies.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::chat::{ChatAdapter, ChatError, ChatSnapshot};
use crate::identity::SessionStore;
use crate::wellness::WellnessBoard;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, OwnedMutexGuard};
use tokio::task::AbortHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionStore>,
    pub chat: ChatHandle,
    pub wellness: Arc<Mutex<WellnessBoard>>,
}

impl AppState {
    pub fn new(session: SessionStore, chat: ChatAdapter) -> Self {
        Self {
            session: Arc::new(session),
            chat: ChatHandle::new(chat),
            wellness: Arc::new(Mutex::new(WellnessBoard::seeded())),
        }
    }
}

/// The chat adapter plus what readers need while a reply streams
///
/// A streamed reply owns the adapter lock until it ends. Readers use the
/// published snapshot instead, and a reset aborts the reply task rather
/// than waiting it out.
#[derive(Clone)]
pub struct ChatHandle {
    adapter: Arc<Mutex<ChatAdapter>>,
    view: watch::Receiver<ChatSnapshot>,
    /// Last spawned reply task. Held while claiming the adapter so a reset
    /// cannot miss a reply that is just starting.
    reply_task: Arc<Mutex<Option<AbortHandle>>>,
}

/// Exclusive use of the adapter
///
/// A send moves `adapter` into its reply task and stores the task's abort
/// handle in `reply_task` before letting go of the claim.
pub struct ChatClaim {
    pub adapter: OwnedMutexGuard<ChatAdapter>,
    pub reply_task: OwnedMutexGuard<Option<AbortHandle>>,
}

impl ChatHandle {
    pub fn new(adapter: ChatAdapter) -> Self {
        Self {
            view: adapter.subscribe(),
            adapter: Arc::new(Mutex::new(adapter)),
            reply_task: Arc::new(Mutex::new(None)),
        }
    }

    /// Latest published state, readable while a reply streams
    pub fn snapshot(&self) -> ChatSnapshot {
        self.view.borrow().clone()
    }

    /// Take the adapter without waiting; busy while a reply streams
    pub fn try_claim(&self) -> Result<ChatClaim, ChatError> {
        let reply_task = Arc::clone(&self.reply_task)
            .try_lock_owned()
            .map_err(|_| ChatError::Busy)?;
        let adapter = Arc::clone(&self.adapter)
            .try_lock_owned()
            .map_err(|_| ChatError::Busy)?;
        Ok(ChatClaim {
            adapter,
            reply_task,
        })
    }

    /// Abort any streaming reply, then drop the session and transcript
    pub async fn reset(&self) {
        let mut reply_task = self.reply_task.lock().await;
        if let Some(task) = reply_task.take() {
            task.abort();
        }
        self.adapter.lock().await.reset();
    }
}
