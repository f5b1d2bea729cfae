//! Long message delivery
//!
//! Lyrics can exceed Telegram's message size. Plain text is split on line
//! boundaries before escaping so that no HTML entity is cut in half.

use crate::api::{display_name, Lyrics, RichLyrics};
use crate::bot::transport::{deliver, ChatTransport, OutgoingMessage, Reply};
use crate::bot::views;
use crate::config::{TELEGRAM_MESSAGE_LIMIT, TELEGRAM_TRUNCATED_LENGTH};
use crate::utils::{split_html_message, split_long_message, telegram_html, truncate_str};
use anyhow::Result;
use html_escape::encode_text;
use teloxide::types::ChatId;

const NO_LYRICS: &str = "No lyrics available";
const TRUNCATION_MARKER: &str = "\n\n... (truncated)";
/// Newline, `=` rule and blank line between header and body
const SEPARATOR_CHARS: usize = 33;

/// Sends plain text as one or more HTML-escaped messages
///
/// # Errors
///
/// Returns an error if any part fails to send.
pub async fn send_long_text(transport: &dyn ChatTransport, chat_id: ChatId, text: &str) -> Result<()> {
    for part in split_long_message(text, TELEGRAM_MESSAGE_LIMIT) {
        transport
            .send(chat_id, OutgoingMessage::html(encode_text(&part)))
            .await?;
    }
    Ok(())
}

/// Header plus lyrics in a single message, cut with a marker when too long
#[must_use]
pub fn truncated_lyrics_message(header: &str, body: &str) -> String {
    let prefix_len = header.chars().count() + SEPARATOR_CHARS;
    if prefix_len + body.chars().count() <= TELEGRAM_MESSAGE_LIMIT {
        return views::lyrics_message(header, body);
    }
    let keep = TELEGRAM_TRUNCATED_LENGTH.saturating_sub(prefix_len);
    let mut message = views::lyrics_message(header, &truncate_str(body, keep));
    message.push_str(TRUNCATION_MARKER);
    message
}

/// Renders plain lyrics for `requested_title`
///
/// Short lyrics go out as one message to `reply`. Longer ones put only the
/// header there and follow up with the body in chunks.
///
/// # Errors
///
/// Returns an error if a message fails to send.
pub async fn send_plain_lyrics(
    transport: &dyn ChatTransport,
    reply: Reply,
    requested_title: &str,
    lyrics: &Lyrics,
) -> Result<()> {
    let title = lyrics
        .title
        .as_deref()
        .unwrap_or_else(|| display_name(requested_title));
    let header = views::lyrics_header(title, lyrics.artist.as_deref(), lyrics.album.as_deref());
    let body = lyrics.lyrics.as_deref().unwrap_or(NO_LYRICS);

    if header.chars().count() + SEPARATOR_CHARS + body.chars().count() <= TELEGRAM_MESSAGE_LIMIT {
        let text = views::lyrics_message(&header, body);
        return deliver(transport, reply, OutgoingMessage::html(text)).await;
    }

    deliver(transport, reply, OutgoingMessage::html(header)).await?;
    send_long_text(transport, reply.chat_id(), body).await
}

/// Sends the header of rich lyrics followed by the converted HTML body
///
/// # Errors
///
/// Returns an error if a message fails to send.
pub async fn send_rich_lyrics(
    transport: &dyn ChatTransport,
    chat_id: ChatId,
    lyrics: &RichLyrics,
) -> Result<()> {
    let header = views::lyrics_header(
        &lyrics.title,
        lyrics.artist.as_deref(),
        lyrics.album.as_deref(),
    );
    transport.send(chat_id, OutgoingMessage::html(header)).await?;

    let body = telegram_html(&lyrics.html_content);
    if body.is_empty() {
        return transport
            .send(chat_id, OutgoingMessage::html(NO_LYRICS))
            .await;
    }
    for part in split_html_message(&body, TELEGRAM_MESSAGE_LIMIT) {
        transport.send(chat_id, OutgoingMessage::html(part)).await?;
    }
    Ok(())
}
