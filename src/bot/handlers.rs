//! Command and callback handlers
//!
//! Everything here runs behind the auth gate: [`handle_message`] invokes
//! the gate first and only routes commands for authenticated sessions;
//! callback queries are guarded the same way.

use crate::api::{ApiClient, Ticket};
use crate::bot::auth::{self, GateOutcome, LOGIN_COMMAND};
use crate::bot::session::{AuthStep, Session, SessionStore};
use crate::bot::views;
use crate::config::Settings;
use crate::i18n::{Lang, Text};
use crate::notify::{Poller, Strategy, Streamer, SubscriptionRegistry, ViewerTickets};
use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use tracing::{debug, error, warn};

/// Command that shows the actions menu
pub const ACTIONS_COMMAND: &str = "/actions";

// Callback identifiers for the inline keyboards.
const CB_COMPLETED: &str = "completed_tickets";
const CB_UNCOMPLETED: &str = "uncompleted_tickets";
const CB_SUBSCRIBE: &str = "subscribe";
const CB_UNSUBSCRIBE: &str = "unsubscribe";
const CB_LANGUAGE: &str = "language";
const CB_LANG_RU: &str = "ru";
const CB_LANG_EN: &str = "en";

/// Entry point for every inbound message: gate first, then route.
///
/// # Errors
///
/// Returns an error if a Telegram API call fails.
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    api: Arc<ApiClient>,
    sessions: Arc<SessionStore>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let text = msg.text();
    let lang = sessions.with(chat_id, |s| s.lang).await;
    let outcome = sessions.with(chat_id, |s| auth::advance(s, text)).await;

    match outcome {
        GateOutcome::Greet => {
            bot.send_message(chat_id, lang.text(Text::Welcome)).await?;
        }
        GateOutcome::Prompt(key) => {
            bot.send_message(chat_id, lang.text(key)).await?;
        }
        GateOutcome::Login { email, password } => {
            let reply =
                auth::resolve_login(&sessions, api.as_ref(), chat_id, &email, &password).await;
            bot.send_message(chat_id, lang.text(reply)).await?;
        }
        GateOutcome::Forward => {
            dispatch_command(&bot, &msg, &sessions, lang).await?;
        }
    }
    Ok(())
}

/// Routes a gated message to its command handler. Non-command text from an
/// authenticated chat is dropped quietly.
async fn dispatch_command(
    bot: &Bot,
    msg: &Message,
    sessions: &SessionStore,
    lang: Lang,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let command = msg
        .text()
        .and_then(|t| t.split_whitespace().next())
        .and_then(|c| c.split('@').next());

    match command {
        Some(LOGIN_COMMAND) => {
            // (Re)start the flow, overwriting any step in progress.
            sessions
                .with(chat_id, |s| {
                    s.step = AuthStep::AwaitingEmail;
                    s.email = None;
                })
                .await;
            bot.send_message(chat_id, lang.text(Text::EnterLogin)).await?;
        }
        Some(ACTIONS_COMMAND) => {
            bot.send_message(chat_id, lang.text(Text::AvailableActions))
                .reply_markup(actions_keyboard(lang))
                .await?;
        }
        other => {
            debug!("unrouted message in chat {chat_id}: {other:?}");
        }
    }
    Ok(())
}

/// Entry point for callback queries from the inline keyboards.
///
/// # Errors
///
/// Returns an error if a Telegram API call fails.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    api: Arc<ApiClient>,
    sessions: Arc<SessionStore>,
    registry: Arc<SubscriptionRegistry>,
    settings: Arc<Settings>,
) -> Result<()> {
    let _ = bot.answer_callback_query(q.id.clone()).await;

    let Some(chat_id) = q.message.as_ref().map(|msg| msg.chat().id) else {
        debug!("callback without originating message, dropped");
        return Ok(());
    };
    let session = sessions.snapshot(chat_id).await;
    let lang = session.lang;

    if !session.authenticated {
        bot.send_message(chat_id, lang.text(Text::NotAuthenticated))
            .await?;
        return Ok(());
    }

    match q.data.as_deref() {
        Some(CB_COMPLETED) => show_tickets(&bot, chat_id, &api, &session, true).await?,
        Some(CB_UNCOMPLETED) => show_tickets(&bot, chat_id, &api, &session, false).await?,
        Some(CB_SUBSCRIBE) => {
            start_subscription(&bot, chat_id, &api, &registry, &settings, &session).await?;
        }
        Some(CB_UNSUBSCRIBE) => match registry.unsubscribe(chat_id).await {
            Ok(()) => {
                bot.send_message(chat_id, lang.text(Text::UnsubscriptionOk))
                    .await?;
            }
            Err(e) => {
                warn!("unsubscribe failed for chat {chat_id}: {e}");
                bot.send_message(chat_id, lang.text(Text::NotSubscribed))
                    .await?;
            }
        },
        Some(CB_LANGUAGE) => {
            bot.send_message(chat_id, lang.text(Text::LanguagePrompt))
                .reply_markup(language_keyboard())
                .await?;
        }
        Some(CB_LANG_RU) => {
            sessions.with(chat_id, |s| s.lang = Lang::Ru).await;
            bot.send_message(chat_id, Lang::Ru.text(Text::LanguageSetRu))
                .await?;
        }
        Some(CB_LANG_EN) => {
            sessions.with(chat_id, |s| s.lang = Lang::En).await;
            bot.send_message(chat_id, Lang::En.text(Text::LanguageSetEn))
                .await?;
        }
        other => {
            debug!("unknown callback in chat {chat_id}: {other:?}");
        }
    }
    Ok(())
}

/// Fetches and renders the completed or uncompleted ticket view.
async fn show_tickets(
    bot: &Bot,
    chat_id: ChatId,
    api: &ApiClient,
    session: &Session,
    done: bool,
) -> Result<()> {
    let lang = session.lang;
    let Some(viewer) = session.user.as_ref() else {
        // Authenticated sessions always carry a profile; treat as a glitch.
        bot.send_message(chat_id, lang.text(Text::GenericError)).await?;
        return Ok(());
    };

    match api.list_tickets(viewer).await {
        Ok(tickets) => {
            let (matching, header, empty) = select_view(tickets, done);

            if matching.is_empty() {
                bot.send_message(chat_id, lang.text(empty)).await?;
            } else {
                bot.send_message(chat_id, views::render_ticket_list(header, &matching, lang))
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
        }
        Err(e) => {
            error!("ticket fetch failed for chat {chat_id}: {e}");
            bot.send_message(chat_id, lang.text(Text::GenericError)).await?;
        }
    }
    Ok(())
}

/// Splits the fetched tickets into the requested view: the matching
/// tickets plus the header and empty-view message keys.
fn select_view(tickets: Vec<Ticket>, done: bool) -> (Vec<Ticket>, Text, Text) {
    let matching = tickets.into_iter().filter(|t| t.is_done == done).collect();
    if done {
        (matching, Text::CompletedTickets, Text::NoCompletedTickets)
    } else {
        (
            matching,
            Text::UncompletedTickets,
            Text::NoUncompletedTickets,
        )
    }
}

/// Starts the configured notification strategy for this chat and registers
/// it, releasing any previous subscription.
async fn start_subscription(
    bot: &Bot,
    chat_id: ChatId,
    api: &Arc<ApiClient>,
    registry: &Arc<SubscriptionRegistry>,
    settings: &Settings,
    session: &Session,
) -> Result<()> {
    let lang = session.lang;
    let Some(viewer) = session.user.clone() else {
        bot.send_message(chat_id, lang.text(Text::GenericError)).await?;
        return Ok(());
    };

    let started = match settings.notify_strategy {
        Strategy::Polling => {
            let poller = Poller {
                bot: bot.clone(),
                chat_id,
                source: ViewerTickets::new(Arc::clone(api), viewer),
                lang,
                period: settings.poll_period(),
                window: settings.notify_window(),
            };
            Ok(poller.spawn())
        }
        Strategy::Streaming => {
            let streamer = Streamer {
                bot: bot.clone(),
                chat_id,
                lang,
                registry: Arc::clone(registry),
            };
            crate::notify::streaming::subscribe(streamer, &settings.api_ws_url).await
        }
    };

    match started {
        Ok((token, task)) => {
            registry.replace(chat_id, token, task).await;
            bot.send_message(chat_id, lang.text(Text::SubscriptionOk))
                .await?;
        }
        Err(e) => {
            error!("subscription failed for chat {chat_id}: {e}");
            bot.send_message(chat_id, lang.text(Text::GenericError)).await?;
        }
    }
    Ok(())
}

/// Inline keyboard for the actions menu
fn actions_keyboard(lang: Lang) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            lang.text(Text::BtnCompleted),
            CB_COMPLETED,
        )],
        vec![InlineKeyboardButton::callback(
            lang.text(Text::BtnUncompleted),
            CB_UNCOMPLETED,
        )],
        vec![InlineKeyboardButton::callback(
            lang.text(Text::BtnSubscribe),
            CB_SUBSCRIBE,
        )],
        vec![InlineKeyboardButton::callback(
            lang.text(Text::BtnUnsubscribe),
            CB_UNSUBSCRIBE,
        )],
        vec![InlineKeyboardButton::callback(
            lang.text(Text::BtnLanguage),
            CB_LANGUAGE,
        )],
    ])
}

/// Inline keyboard for language selection
fn language_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🇷🇺 Русский", CB_LANG_RU)],
        vec![InlineKeyboardButton::callback("🇬🇧 English", CB_LANG_EN)],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ticket(id: i64, is_done: bool) -> Ticket {
        Ticket {
            id,
            title: format!("ticket {id}"),
            description: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            is_done,
            device: None,
        }
    }

    #[test]
    fn test_completed_view_selects_done_tickets() {
        let tickets = vec![ticket(1, true), ticket(2, false), ticket(3, true)];

        let (matching, header, empty) = select_view(tickets, true);
        assert_eq!(
            matching.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(header, Text::CompletedTickets);
        assert_eq!(empty, Text::NoCompletedTickets);
    }

    #[test]
    fn test_uncompleted_view_selects_open_tickets() {
        let tickets = vec![ticket(1, true), ticket(2, false)];

        let (matching, header, empty) = select_view(tickets, false);
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, 2);
        assert_eq!(header, Text::UncompletedTickets);
        assert_eq!(empty, Text::NoUncompletedTickets);
    }

    #[test]
    fn test_empty_fetch_yields_the_empty_view() {
        let (matching, _, empty) = select_view(Vec::new(), true);
        assert!(matching.is_empty());
        assert_eq!(empty, Text::NoCompletedTickets);
    }
}
