//! Ticketing backend client
//!
//! The gateway attaches the bearer token to every outbound request and
//! recovers from expired access tokens with a single refresh-and-retry
//! cycle. Credentials live in an injectable [`CredentialStore`] shared by
//! all conversations.

/// Token-refreshing request gateway
pub mod client;
/// Process-wide credential pair holder
pub mod credentials;
/// Backend data transfer objects
pub mod types;

pub use client::{ApiClient, LoginService};
pub use credentials::CredentialStore;
pub use types::{Device, Role, Ticket, TokenPair, UserProfile};

use thiserror::Error;

/// Errors produced by backend calls
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend rejected the request's authorization (HTTP 401)
    #[error("authorization rejected: {0}")]
    Unauthorized(String),
    /// The backend answered with a non-success status
    #[error("API error: {0}")]
    Api(String),
    /// The request never completed (connectivity, timeout)
    #[error("network error: {0}")]
    Network(String),
    /// The response body could not be decoded
    #[error("JSON error: {0}")]
    Json(String),
}
