#![deny(missing_docs)]
//! Telegram helpdesk bot.
//!
//! Lets a user authenticate against a ticketing backend, browse
//! completed/uncompleted tickets, and receive near-real-time notifications
//! of ticket changes over a polling or push subscription.

/// Ticketing backend client: credentials, token-refreshing gateway, DTOs
pub mod api;
/// Telegram bot implementation: auth gate, sessions, handlers, views
pub mod bot;
/// Configuration management
pub mod config;
/// Language selection and user-facing strings
pub mod i18n;
/// Notification subscriptions: registry, polling and streaming engines
pub mod notify;
