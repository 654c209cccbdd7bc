//! Interval-polling delivery
//!
//! Re-fetches the viewer's tickets on a fixed period and reports the ones
//! whose creation or update falls inside the recency window. Recency is
//! reconstructed locally against the wall clock, so a period longer than
//! the window can miss events and an overlapping window can repeat them;
//! that is the strategy's contract.

use crate::api::{ApiClient, ApiError, Ticket, UserProfile};
use crate::bot::views;
use crate::i18n::Lang;
use crate::notify::TicketEvent;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Classifies a ticket against the recency window.
///
/// The comparison is inclusive: a ticket exactly `window` old still
/// qualifies. Creation takes priority when both timestamps fall inside
/// the window.
#[must_use]
pub fn classify(ticket: &Ticket, now: DateTime<Utc>, window: TimeDelta) -> Option<TicketEvent> {
    if now - ticket.created_at <= window {
        return Some(TicketEvent::Created);
    }
    if now - ticket.updated_at <= window {
        return Some(TicketEvent::Updated);
    }
    None
}

/// Where a poll tick gets its tickets from.
///
/// A trait seam so the timer loop can be exercised in tests without a
/// backend behind it.
#[async_trait]
pub trait TicketSource: Send + Sync + 'static {
    /// Fetches the current ticket set for the subscriber.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` when the fetch fails; the tick is skipped.
    async fn fetch(&self) -> Result<Vec<Ticket>, ApiError>;
}

/// Fetches through the gateway on behalf of one viewer.
pub struct ViewerTickets {
    api: Arc<ApiClient>,
    viewer: UserProfile,
}

impl ViewerTickets {
    /// Binds the gateway to the viewer whose tickets are polled.
    #[must_use]
    pub fn new(api: Arc<ApiClient>, viewer: UserProfile) -> Self {
        Self { api, viewer }
    }
}

#[async_trait]
impl TicketSource for ViewerTickets {
    async fn fetch(&self) -> Result<Vec<Ticket>, ApiError> {
        self.api.list_tickets(&self.viewer).await
    }
}

/// One chat's polling subscription
pub struct Poller<S> {
    /// Bot used to deliver notifications
    pub bot: Bot,
    /// Chat the subscription belongs to
    pub chat_id: ChatId,
    /// Ticket source consulted on every tick
    pub source: S,
    /// Language the notifications are rendered in
    pub lang: Lang,
    /// Tick period
    pub period: Duration,
    /// Recency window for the classifier
    pub window: TimeDelta,
}

impl<S: TicketSource> Poller<S> {
    /// Spawns the polling task. The returned token stops it; nothing else
    /// does, since a failed tick is logged and skipped rather than fatal.
    #[must_use]
    pub fn spawn(self) -> (CancellationToken, JoinHandle<()>) {
        let token = CancellationToken::new();
        let child = token.clone();
        let task = tokio::spawn(async move { self.run(child).await });
        (token, task)
    }

    async fn run(self, token: CancellationToken) {
        info!(
            "polling subscription started for chat {} (period {:?})",
            self.chat_id, self.period
        );
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // An interval yields immediately; the first poll happens one full
        // period after subscribing.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = token.cancelled() => {
                    info!("polling subscription stopped for chat {}", self.chat_id);
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        warn!("ticket poll skipped for chat {}: {e}", self.chat_id);
                    }
                }
            }
        }
    }

    /// One poll cycle: fetch, classify, notify.
    async fn tick(&self) -> anyhow::Result<()> {
        let tickets = self.source.fetch().await?;
        let now = Utc::now();

        for ticket in &tickets {
            if let Some(event) = classify(ticket, now, self.window) {
                let text = views::render_ticket_event(event, ticket, self.lang);
                self.bot
                    .send_message(self.chat_id, text)
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
        }
        Ok(())
    }
}
