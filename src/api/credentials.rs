//! Process-wide credential pair holder
//!
//! One store is shared by every conversation: the backend issues one
//! access/refresh pair per bot process. The store is passed into the
//! gateway explicitly rather than living in a module-level global, and it
//! serializes refreshes so concurrent 401s collapse into one refresh call.

use crate::api::types::TokenPair;
use crate::api::ApiError;
use std::future::Future;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Shared holder of the current access/refresh token pair
#[derive(Debug, Default)]
pub struct CredentialStore {
    pair: RwLock<Option<TokenPair>>,
    // Held for the whole refresh exchange; callers queued here re-check the
    // pair before refreshing themselves.
    refresh_gate: Mutex<()>,
}

impl CredentialStore {
    /// Creates an empty store (no pair until the first successful login)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current pair, if any
    pub async fn snapshot(&self) -> Option<TokenPair> {
        self.pair.read().await.clone()
    }

    /// Replaces the stored pair (post-login or post-refresh)
    pub async fn store(&self, pair: TokenPair) {
        *self.pair.write().await = Some(pair);
    }

    /// Clears the stored pair
    pub async fn clear(&self) {
        *self.pair.write().await = None;
    }

    /// Single-flight token refresh.
    ///
    /// `stale` is the pair the caller's request failed with. If another
    /// caller already completed a refresh while this one waited for the
    /// gate, the fresh pair is returned without a second exchange;
    /// otherwise `exchange` runs and its result is stored.
    ///
    /// # Errors
    ///
    /// Propagates the error from `exchange`; the stored pair is left
    /// untouched in that case.
    pub async fn refresh_with<F, Fut>(
        &self,
        stale: &TokenPair,
        exchange: F,
    ) -> Result<TokenPair, ApiError>
    where
        F: FnOnce(TokenPair) -> Fut,
        Fut: Future<Output = Result<TokenPair, ApiError>>,
    {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.snapshot().await {
            if current.access != stale.access {
                debug!("token pair already refreshed by a concurrent request");
                return Ok(current);
            }
        }

        let fresh = exchange(stale.clone()).await?;
        self.store(fresh.clone()).await;
        Ok(fresh)
    }
}
