//! Per-conversation session state
//!
//! Each chat owns one [`Session`], created on its first inbound update and
//! kept for the life of the process. Sessions are mutated only through
//! [`SessionStore::with`], never as ambient context.

use crate::api::UserProfile;
use crate::i18n::Lang;
use std::collections::HashMap;
use teloxide::types::ChatId;
use tokio::sync::Mutex;

/// Where a conversation stands in the login flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStep {
    /// No login in progress
    #[default]
    None,
    /// Next message is taken verbatim as the email
    AwaitingEmail,
    /// Next message is taken as the password
    AwaitingPassword,
}

/// Mutable state of one conversation
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Whether the welcome message has been sent
    pub greeted: bool,
    /// Current login-flow step
    pub step: AuthStep,
    /// Email captured by the login flow, pending the password
    pub email: Option<String>,
    /// Whether login has succeeded for this chat
    pub authenticated: bool,
    /// Profile returned by the backend on login
    pub user: Option<UserProfile>,
    /// Language of the conversation
    pub lang: Lang,
}

impl Session {
    /// Records a successful login: the step is cleared and the profile
    /// stored. Authentication is terminal until process restart.
    pub fn apply_login(&mut self, user: UserProfile) {
        self.step = AuthStep::None;
        self.email = None;
        self.authenticated = true;
        self.user = Some(user);
    }

    /// Records a failed login: the flow resets, authentication unchanged.
    pub fn reject_login(&mut self) {
        self.step = AuthStep::None;
        self.email = None;
    }
}

/// Process-wide store of all sessions, keyed by chat id
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<ChatId, Session>>,
}

impl SessionStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the chat's session, creating it on first access.
    /// The lock is held only for the closure; never across I/O.
    pub async fn with<R>(&self, chat_id: ChatId, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut map = self.inner.lock().await;
        f(map.entry(chat_id).or_default())
    }

    /// Returns a copy of the chat's session, creating it on first access
    pub async fn snapshot(&self, chat_id: ChatId) -> Session {
        self.with(chat_id, |session| session.clone()).await
    }
}
