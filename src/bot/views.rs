//! HTML rendering of tickets and notifications
//!
//! All ticket fields come from the backend and are escaped before being
//! interpolated into HTML.

use crate::api::Ticket;
use crate::i18n::{Lang, Text};
use crate::notify::TicketEvent;
use chrono::{DateTime, Utc};
use html_escape::encode_text;
use std::fmt::Write as _;

const SEPARATOR: &str = "<b>──────────────────</b>\n";

/// Renders a list view (completed or uncompleted tickets) under `header`.
#[must_use]
pub fn render_ticket_list(header: Text, tickets: &[Ticket], lang: Lang) -> String {
    let mut out = format!("<b>{}</b>\n\n", lang.text(header));
    for ticket in tickets {
        push_ticket_block(&mut out, ticket, lang, None);
    }
    out
}

/// Renders a single notification message for a created/updated ticket.
#[must_use]
pub fn render_ticket_event(event: TicketEvent, ticket: &Ticket, lang: Lang) -> String {
    let header = match event {
        TicketEvent::Created => Text::TicketCreated,
        TicketEvent::Updated => Text::TicketUpdated,
    };
    let mut out = format!("<b>{}</b>\n\n", lang.text(header));
    push_ticket_block(&mut out, ticket, lang, Some(event));
    out
}

/// One ticket block. List views show the creation time; notifications show
/// the timestamp matching the event, plus the ticket status.
fn push_ticket_block(out: &mut String, ticket: &Ticket, lang: Lang, event: Option<TicketEvent>) {
    out.push_str(SEPARATOR);

    let _ = writeln!(
        out,
        "<b>{}:</b> {}",
        lang.text(Text::TicketTitle),
        encode_text(&ticket.title)
    );
    let _ = writeln!(
        out,
        "<b>{}:</b> {}",
        lang.text(Text::TicketDescription),
        encode_text(&ticket.description)
    );

    match event {
        Some(TicketEvent::Updated) => {
            let _ = writeln!(
                out,
                "<b>{}:</b> {}",
                lang.text(Text::TicketUpdatedAt),
                format_datetime(ticket.updated_at, lang)
            );
        }
        _ => {
            let _ = writeln!(
                out,
                "<b>{}:</b> {}",
                lang.text(Text::TicketCreatedAt),
                format_datetime(ticket.created_at, lang)
            );
        }
    }

    if event.is_some() {
        let status = if ticket.is_done {
            Text::Completed
        } else {
            Text::InProgress
        };
        let _ = writeln!(
            out,
            "<b>{}:</b> {}",
            lang.text(Text::TicketStatus),
            lang.text(status)
        );
    }

    if let Some(device) = &ticket.device {
        let _ = writeln!(
            out,
            "<b>{}:</b> {}",
            lang.text(Text::DeviceTitle),
            encode_text(&device.title)
        );
        let _ = writeln!(
            out,
            "<b>{}:</b> {}",
            lang.text(Text::DeviceInventoryNumber),
            encode_text(&device.inventory_number)
        );
    }

    out.push('\n');
}

/// Day/month plus time, in the order the language expects.
#[must_use]
pub fn format_datetime(stamp: DateTime<Utc>, lang: Lang) -> String {
    match lang {
        Lang::Ru => stamp.format("%d.%m %H:%M").to_string(),
        Lang::En => stamp.format("%m/%d %H:%M").to_string(),
    }
}
