//! Push-channel (WebSocket) delivery
//!
//! One persistent channel per subscribed chat. Events arrive as they occur
//! upstream; there is no local recency filtering. When the server closes
//! or breaks the channel the subscriber is told and the registry entry is
//! released; there is no reconnect, the user re-subscribes.

use crate::api::Ticket;
use crate::bot::views;
use crate::i18n::{Lang, Text};
use crate::notify::{NotifyError, SubscriptionRegistry, TicketEvent};
use std::sync::Arc;
use futures_util::StreamExt;
use serde::Deserialize;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Typed push envelope: `{"type": ..., "data": <ticket>}`
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PushEvent {
    /// A ticket was created upstream
    TicketCreated(Ticket),
    /// A ticket was updated upstream
    TicketUpdated(Ticket),
}

/// Parses one text frame. Unknown types and malformed payloads are both
/// dropped here with a debug log; a bad frame never fails the channel.
fn parse_envelope(text: &str) -> Option<PushEvent> {
    match serde_json::from_str(text) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!("ignoring push frame: {e}");
            None
        }
    }
}

/// One chat's streaming subscription
pub struct Streamer {
    /// Bot used to deliver notifications
    pub bot: Bot,
    /// Chat the subscription belongs to
    pub chat_id: ChatId,
    /// Language the notifications are rendered in
    pub lang: Lang,
    /// Registry the subscription releases itself from when the channel dies
    pub registry: Arc<SubscriptionRegistry>,
}

/// Opens the push channel and spawns the reader task.
///
/// The connection is established before the task is spawned so a dead
/// endpoint is reported to the subscriber instead of failing silently in
/// the background.
///
/// # Errors
///
/// Returns [`NotifyError::Connect`] when the channel cannot be opened.
pub async fn subscribe(
    streamer: Streamer,
    ws_url: &str,
) -> Result<(CancellationToken, JoinHandle<()>), NotifyError> {
    let (stream, _response) = connect_async(ws_url)
        .await
        .map_err(|e| NotifyError::Connect(e.to_string()))?;
    info!("push channel established for chat {}", streamer.chat_id);

    let token = CancellationToken::new();
    let child = token.clone();
    let task = tokio::spawn(async move { streamer.run(stream, child).await });
    Ok((token, task))
}

impl Streamer {
    async fn run(self, mut stream: WsStream, token: CancellationToken) {
        loop {
            tokio::select! {
                () = token.cancelled() => {
                    let _ = stream.close(None).await;
                    info!("push channel closed for chat {} (unsubscribed)", self.chat_id);
                    return;
                }
                frame = stream.next() => {
                    match frame {
                        None => {
                            // Upstream hung up; no reconnect.
                            info!("push channel closed by server for chat {}", self.chat_id);
                            self.channel_lost().await;
                            return;
                        }
                        Some(Err(e)) => {
                            warn!("push channel error for chat {}: {e}", self.chat_id);
                            self.channel_lost().await;
                            return;
                        }
                        Some(Ok(WsMessage::Text(text))) => {
                            if let Some(event) = parse_envelope(text.as_str()) {
                                self.notify(event).await;
                            }
                        }
                        // Pings, pongs, binary frames: transport noise.
                        Some(Ok(_)) => {}
                    }
                }
            }
        }
    }

    /// Tells the subscriber delivery stopped and drops the now-dead
    /// registry entry, so a later unsubscribe does not report success for
    /// a channel that died long ago.
    async fn channel_lost(&self) {
        if let Err(e) = self
            .bot
            .send_message(self.chat_id, self.lang.text(Text::SubscriptionLost))
            .await
        {
            warn!("could not report lost channel to chat {}: {e}", self.chat_id);
        }
        // Nothing to release when the channel died before registration.
        let _ = self.registry.unsubscribe(self.chat_id).await;
    }

    /// Sends exactly one notification for one envelope.
    async fn notify(&self, event: PushEvent) {
        let (kind, ticket) = match event {
            PushEvent::TicketCreated(ticket) => (TicketEvent::Created, ticket),
            PushEvent::TicketUpdated(ticket) => (TicketEvent::Updated, ticket),
        };
        let text = views::render_ticket_event(kind, &ticket, self.lang);
        if let Err(e) = self
            .bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html)
            .await
        {
            warn!("failed to deliver push notification to chat {}: {e}", self.chat_id);
        }
    }
}
