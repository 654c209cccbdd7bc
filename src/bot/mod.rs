//! Telegram bot implementation
//!
//! Inbound updates pass through the auth gate before any handler runs;
//! authenticated traffic reaches the command/callback router.

/// Session authentication state machine
pub mod auth;
/// Command and callback handlers
pub mod handlers;
/// Per-conversation session state
pub mod session;
/// HTML rendering of tickets and notifications
pub mod views;

pub use session::{AuthStep, Session, SessionStore};
