//! Hand-off of verification codes from the dispatcher to a waiting login.
//!
//! Each chat has at most one waiter. Registering a new waiter drops the old
//! one, which wakes the abandoned login with a closed channel.

use std::collections::HashMap;
use std::time::Duration;

use teloxide::types::ChatId;
use tokio::sync::{oneshot, Mutex};
use tracing::debug;

/// Outcome of waiting for a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeWait {
    Received(String),
    TimedOut,
    /// The waiter was replaced or cancelled before a code arrived
    Abandoned,
}

#[derive(Debug, Default)]
pub struct CodeRelay {
    waiters: Mutex<HashMap<ChatId, oneshot::Sender<String>>>,
}

impl CodeRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start expecting a code for `chat_id`, replacing any previous waiter
    pub async fn register(&self, chat_id: ChatId) -> oneshot::Receiver<String> {
        let (tx, rx) = oneshot::channel();
        if self.waiters.lock().await.insert(chat_id, tx).is_some() {
            debug!(chat_id = %chat_id, "Replaced pending code waiter");
        }
        rx
    }

    /// Deliver `code` to the login waiting in `chat_id`; false if none is waiting
    pub async fn submit(&self, chat_id: ChatId, code: &str) -> bool {
        match self.waiters.lock().await.remove(&chat_id) {
            Some(tx) => tx.send(code.to_string()).is_ok(),
            None => false,
        }
    }

    /// Drop the waiter for `chat_id`; true if one existed
    pub async fn cancel(&self, chat_id: ChatId) -> bool {
        self.waiters.lock().await.remove(&chat_id).is_some()
    }

    /// Forget the waiter for `chat_id` only if its receiver is gone
    pub async fn release_closed(&self, chat_id: ChatId) {
        let mut waiters = self.waiters.lock().await;
        if waiters.get(&chat_id).is_some_and(|tx| tx.is_closed()) {
            waiters.remove(&chat_id);
        }
    }

    pub async fn is_waiting(&self, chat_id: ChatId) -> bool {
        self.waiters
            .lock()
            .await
            .get(&chat_id)
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Wait on a receiver from [`CodeRelay::register`] for at most `limit`
    pub async fn wait(receiver: oneshot::Receiver<String>, limit: Duration) -> CodeWait {
        match tokio::time::timeout(limit, receiver).await {
            Ok(Ok(code)) => CodeWait::Received(code),
            Ok(Err(_)) => CodeWait::Abandoned,
            Err(_) => CodeWait::TimedOut,
        }
    }
}
