//! Configuration and settings management
//!
//! Loads settings from environment variables (and optional `config/*` files)
//! and exposes typed accessors for the durations derived from them.

use crate::notify::Strategy;
use chrono::TimeDelta;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Base URL of the ticketing backend REST API
    pub api_url: String,

    /// URL of the backend push-notification WebSocket endpoint
    pub api_ws_url: String,

    /// Notification delivery strategy (`polling` or `streaming`)
    #[serde(default)]
    pub notify_strategy: Strategy,

    /// Period between ticket polls, in seconds
    #[serde(default = "default_poll_period_secs")]
    pub poll_period_secs: u64,

    /// Recency window for classifying a ticket as new/updated, in seconds
    #[serde(default = "default_notify_window_secs")]
    pub notify_window_secs: u64,

    /// Timeout applied to every backend HTTP request, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

const fn default_poll_period_secs() -> u64 {
    60
}

const fn default_notify_window_secs() -> u64 {
    60
}

const fn default_http_timeout_secs() -> u64 {
    30
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required value is
    /// missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in the current environment file
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked into git
            .add_source(File::with_name("config/local").required(false))
            // Settings from environment variables directly.
            // Environment::default() auto-converts UPPER_SNAKE_CASE to
            // snake_case; ignore_empty treats empty env vars as unset.
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Period between ticket polls
    #[must_use]
    pub const fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_period_secs)
    }

    /// Recency window used by the polling classifier. Values beyond what
    /// a `TimeDelta` can hold clamp to the maximum instead of panicking.
    #[must_use]
    pub fn notify_window(&self) -> TimeDelta {
        i64::try_from(self.notify_window_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Timeout for backend HTTP requests
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn set_required_env() {
        env::set_var("TELEGRAM_TOKEN", "dummy_token");
        env::set_var("API_URL", "http://localhost:3000/api");
        env::set_var("API_WS_URL", "ws://localhost:3000/ws");
    }

    fn clear_env() {
        env::remove_var("TELEGRAM_TOKEN");
        env::remove_var("API_URL");
        env::remove_var("API_WS_URL");
        env::remove_var("POLL_PERIOD_SECS");
        env::remove_var("NOTIFY_STRATEGY");
    }

    // Single test touching the process environment to avoid races between
    // parallel test threads.
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        set_required_env();

        let settings = Settings::new()?;
        assert_eq!(settings.api_url, "http://localhost:3000/api");
        assert_eq!(settings.poll_period_secs, 60);
        assert_eq!(settings.notify_window_secs, 60);
        assert_eq!(settings.notify_strategy, Strategy::Streaming);

        env::set_var("POLL_PERIOD_SECS", "15");
        env::set_var("NOTIFY_STRATEGY", "polling");
        let settings = Settings::new()?;
        assert_eq!(settings.poll_period(), Duration::from_secs(15));
        assert_eq!(settings.notify_strategy, Strategy::Polling);

        clear_env();
        Ok(())
    }

    #[test]
    fn test_notify_window_is_seconds() {
        let settings = Settings {
            telegram_token: "dummy".to_string(),
            api_url: String::new(),
            api_ws_url: String::new(),
            notify_strategy: Strategy::default(),
            poll_period_secs: 60,
            notify_window_secs: 90,
            http_timeout_secs: 30,
        };
        assert_eq!(settings.notify_window(), TimeDelta::seconds(90));
        assert_eq!(settings.http_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_notify_window_clamps_oversized_values() {
        let settings = Settings {
            telegram_token: "dummy".to_string(),
            api_url: String::new(),
            api_ws_url: String::new(),
            notify_strategy: Strategy::default(),
            poll_period_secs: 60,
            notify_window_secs: u64::MAX,
            http_timeout_secs: 30,
        };
        assert_eq!(settings.notify_window(), TimeDelta::MAX);

        // Still clamps when the seconds fit an i64 but not a TimeDelta.
        let settings = Settings {
            notify_window_secs: u64::MAX / 2,
            ..settings
        };
        assert_eq!(settings.notify_window(), TimeDelta::MAX);
    }
}
