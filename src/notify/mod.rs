//! Notification subscriptions
//!
//! Two interchangeable delivery strategies surface ticket changes to a
//! chat: periodic polling with local recency classification, and a
//! persistent push channel. Either way the running task is owned by the
//! [`SubscriptionRegistry`], which enforces one subscription per chat and
//! lets the shutdown path cancel everything it spawned.

/// Interval-polling delivery
pub mod polling;
/// Push-channel (WebSocket) delivery
pub mod streaming;

pub use polling::{Poller, TicketSource, ViewerTickets};
pub use streaming::Streamer;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use teloxide::types::ChatId;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Which delivery strategy the bot subscribes chats with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Periodic re-fetch with timestamp-window diffing
    Polling,
    /// Persistent push channel with typed events
    #[default]
    Streaming,
}

/// What happened to a ticket, as reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketEvent {
    /// The ticket was created recently
    Created,
    /// The ticket was updated recently (and is not new)
    Updated,
}

/// Errors from the subscription layer
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Unsubscribe was requested but no subscription is active
    #[error("no active subscription for this chat")]
    NotSubscribed,
    /// The push channel could not be opened
    #[error("failed to open push channel: {0}")]
    Connect(String),
}

struct Subscription {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Registry of active subscriptions, keyed by chat id
#[derive(Default)]
pub struct SubscriptionRegistry {
    inner: Mutex<HashMap<ChatId, Subscription>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscription task for `chat_id`, releasing any previous
    /// one first so re-subscribing never leaks a running task.
    pub async fn replace(&self, chat_id: ChatId, token: CancellationToken, task: JoinHandle<()>) {
        let previous = self
            .inner
            .lock()
            .await
            .insert(chat_id, Subscription { token, task });
        if let Some(old) = previous {
            debug!("releasing previous subscription for chat {chat_id}");
            old.token.cancel();
        }
    }

    /// Cancels the chat's subscription.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NotSubscribed`] when there is nothing to
    /// release; the caller reports that to the user instead of silently
    /// succeeding.
    pub async fn unsubscribe(&self, chat_id: ChatId) -> Result<(), NotifyError> {
        match self.inner.lock().await.remove(&chat_id) {
            Some(sub) => {
                sub.token.cancel();
                Ok(())
            }
            None => Err(NotifyError::NotSubscribed),
        }
    }

    /// Cancels every subscription and waits for the tasks to wind down.
    /// Runs on process shutdown so no background work outlives dispatch.
    pub async fn shutdown(&self) {
        let drained: Vec<(ChatId, Subscription)> = self.inner.lock().await.drain().collect();
        if drained.is_empty() {
            return;
        }
        info!("shutting down {} active subscription(s)", drained.len());
        for (_, sub) in &drained {
            sub.token.cancel();
        }
        for (chat_id, sub) in drained {
            if sub.task.await.is_err() {
                debug!("subscription task for chat {chat_id} ended abnormally");
            }
        }
    }

    /// Number of currently registered subscriptions
    pub async fn active_count(&self) -> usize {
        self.inner.lock().await.len()
    }
}
