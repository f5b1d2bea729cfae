//! Command, free-text and button handlers
//!
//! Handlers take the [`BotContext`] and a [`ChatTransport`] explicitly.
//! Lyrics API failures are rendered as chat replies; only transport errors
//! are returned to the dispatcher.

use crate::api::{ApiError, LyricsApi};
use crate::bot::callback::CallbackAction;
use crate::bot::context::BotContext;
use crate::bot::messaging::{send_plain_lyrics, send_rich_lyrics};
use crate::bot::session::PendingInput;
use crate::bot::transport::{deliver, ChatTransport, OutgoingMessage, Reply};
use crate::bot::views;
use crate::config::{
    ALBUM_SONGS_LIMIT, ARTISTS_LIMIT, ARTIST_ALBUMS_LIMIT, RANDOM_ARTIST_SAMPLE, SEARCH_LIMIT,
};
use anyhow::Result;
use html_escape::encode_text;
use rand::seq::SliceRandom;
use teloxide::types::{ChatId, MessageId};
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "Supported commands:")]
pub enum Command {
    /// Welcome text and main menu
    #[command(description = "Start the bot and see welcome message")]
    Start,
    /// Command reference
    #[command(description = "Show help and available commands")]
    Help,
    /// Prefix search
    #[command(description = "Search for music (prefix search)")]
    Search(String),
    /// Full-text search
    #[command(description = "Full text search for music")]
    SearchFull(String),
    /// Plain lyrics of a song path
    #[command(description = "Get plain text lyrics for a song")]
    Lyrics(String),
    /// Formatted lyrics of a song path
    #[command(description = "Get formatted lyrics for a song")]
    RichLyrics(String),
    /// Lyrics of a random song
    #[command(description = "Get random song lyrics")]
    RandomLyrics,
    /// Albums of an artist
    #[command(description = "Get albums by an artist")]
    Artist(String),
    /// Songs of an `Artist/Album` path
    #[command(description = "Get songs in an album")]
    Album(String),
    /// Artist directory
    #[command(description = "List all available artists")]
    Artists,
}

/// Which search endpoint a query goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Titles starting with the query
    Prefix,
    /// Query anywhere in the content
    Full,
}

/// Message a pressed button is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackOrigin {
    /// User who pressed the button
    pub user_id: i64,
    /// Chat of the message
    pub chat_id: ChatId,
    /// The message carrying the keyboard
    pub message_id: MessageId,
}

async fn show_typing(transport: &dyn ChatTransport, chat_id: ChatId) {
    if let Err(e) = transport.typing(chat_id).await {
        debug!("Typing indicator failed: {e}");
    }
}

async fn send_html(transport: &dyn ChatTransport, chat_id: ChatId, text: &str) -> Result<()> {
    transport.send(chat_id, OutgoingMessage::html(text)).await
}

/// Runs a parsed command
///
/// # Errors
///
/// Returns an error if a reply cannot be delivered.
pub async fn handle_command(
    ctx: &BotContext,
    transport: &dyn ChatTransport,
    chat_id: ChatId,
    user_id: i64,
    cmd: Command,
) -> Result<()> {
    info!(user_id, ?cmd, "Command received");
    match cmd {
        Command::Start => {
            ctx.sessions.clear(user_id).await;
            send_welcome(transport, Reply::Send(chat_id)).await
        }
        Command::Help => send_html(transport, chat_id, views::HELP).await,
        Command::Search(query) => search(ctx, transport, chat_id, &query, SearchMode::Prefix).await,
        Command::SearchFull(query) => {
            search(ctx, transport, chat_id, &query, SearchMode::Full).await
        }
        Command::Lyrics(title) => {
            if title.trim().is_empty() {
                return send_html(transport, chat_id, views::USAGE_LYRICS).await;
            }
            lyrics(ctx, transport, Reply::Send(chat_id), title.trim()).await
        }
        Command::RichLyrics(title) => {
            if title.trim().is_empty() {
                return send_html(transport, chat_id, views::USAGE_RICH_LYRICS).await;
            }
            rich_lyrics(ctx, transport, chat_id, title.trim()).await
        }
        Command::RandomLyrics => random_lyrics(ctx, transport, chat_id).await,
        Command::Artist(name) => {
            if name.trim().is_empty() {
                return send_html(transport, chat_id, views::USAGE_ARTIST).await;
            }
            artist(ctx, transport, Reply::Send(chat_id), name.trim()).await
        }
        Command::Album(path) => {
            if path.trim().is_empty() {
                return send_html(transport, chat_id, views::USAGE_ALBUM).await;
            }
            album(ctx, transport, Reply::Send(chat_id), path.trim()).await
        }
        Command::Artists => artists(ctx, transport, chat_id).await,
    }
}

/// Routes a non-command text message
///
/// A pending menu input turns the text into the argument of the matching
/// lookup; otherwise the reply is a keyword hint or a greeting.
///
/// # Errors
///
/// Returns an error if a reply cannot be delivered.
pub async fn handle_text(
    ctx: &BotContext,
    transport: &dyn ChatTransport,
    chat_id: ChatId,
    user_id: i64,
    text: &str,
) -> Result<()> {
    let text = text.trim();
    match ctx.sessions.take(user_id).await {
        Some(PendingInput::Artist) => {
            info!(user_id, artist = %text, "Pending artist input");
            artist(ctx, transport, Reply::Send(chat_id), text).await
        }
        Some(PendingInput::Album) => {
            info!(user_id, album = %text, "Pending album input");
            album(ctx, transport, Reply::Send(chat_id), text).await
        }
        Some(PendingInput::SongQuery) => {
            info!(user_id, query = %text, "Pending song query");
            search(ctx, transport, chat_id, text, SearchMode::Prefix).await
        }
        None => {
            let lowered = text.to_lowercase();
            let reply = if views::MUSIC_KEYWORDS.iter().any(|k| lowered.contains(k)) {
                views::KEYWORD_HINT
            } else {
                views::GREETING
            };
            send_html(transport, chat_id, reply).await
        }
    }
}

/// Decodes and runs an inline button press
///
/// Unknown payloads are logged and ignored.
///
/// # Errors
///
/// Returns an error if a reply cannot be delivered.
pub async fn handle_callback(
    ctx: &BotContext,
    transport: &dyn ChatTransport,
    origin: CallbackOrigin,
    data: &str,
) -> Result<()> {
    let action = match data.parse::<CallbackAction>() {
        Ok(action) => action,
        Err(e) => {
            warn!(user_id = origin.user_id, "Ignoring button press: {e}");
            return Ok(());
        }
    };
    info!(user_id = origin.user_id, %action, "Button pressed");

    let chat_id = origin.chat_id;
    let edit = Reply::Edit(chat_id, origin.message_id);
    match action {
        CallbackAction::Artist(name) => artist(ctx, transport, edit, &name).await,
        CallbackAction::Album(path) => album(ctx, transport, edit, &path).await,
        CallbackAction::Lyrics(path) => lyrics(ctx, transport, edit, &path).await,
        CallbackAction::MoreAlbums(name) => more_albums(ctx, transport, edit, &name).await,
        CallbackAction::MoreSongs(path) => more_songs(ctx, transport, edit, &path).await,
        CallbackAction::SearchArtist => {
            prompt(ctx, transport, origin, PendingInput::Artist, views::PROMPT_ARTIST).await
        }
        CallbackAction::SearchAlbum => {
            prompt(ctx, transport, origin, PendingInput::Album, views::PROMPT_ALBUM).await
        }
        CallbackAction::SearchSong => {
            prompt(ctx, transport, origin, PendingInput::SongQuery, views::PROMPT_SONG).await
        }
        CallbackAction::InlineSearch => {
            let message = OutgoingMessage::html(views::quick_search(&ctx.bot_username))
                .with_keyboard(views::quick_search_keyboard());
            deliver(transport, edit, message).await
        }
        CallbackAction::BackToHome => {
            ctx.sessions.clear(origin.user_id).await;
            send_welcome(transport, edit).await
        }
        CallbackAction::RandomLyrics => random_lyrics(ctx, transport, chat_id).await,
    }
}

async fn send_welcome(transport: &dyn ChatTransport, reply: Reply) -> Result<()> {
    let message = OutgoingMessage::html(views::WELCOME).with_keyboard(views::main_menu_keyboard());
    deliver(transport, reply, message).await
}

async fn prompt(
    ctx: &BotContext,
    transport: &dyn ChatTransport,
    origin: CallbackOrigin,
    kind: PendingInput,
    text: &str,
) -> Result<()> {
    ctx.sessions.set(origin.user_id, kind).await;
    let message = OutgoingMessage::html(text).with_keyboard(views::home_keyboard());
    deliver(
        transport,
        Reply::Edit(origin.chat_id, origin.message_id),
        message,
    )
    .await
}

/// `/search` and `/search_full`
///
/// # Errors
///
/// Returns an error if the reply cannot be delivered.
pub async fn search(
    ctx: &BotContext,
    transport: &dyn ChatTransport,
    chat_id: ChatId,
    query: &str,
    mode: SearchMode,
) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        let usage = match mode {
            SearchMode::Prefix => views::USAGE_SEARCH,
            SearchMode::Full => views::USAGE_SEARCH_FULL,
        };
        return send_html(transport, chat_id, usage).await;
    }

    show_typing(transport, chat_id).await;
    let result = match mode {
        SearchMode::Prefix => ctx.api.search_prefix(query, SEARCH_LIMIT).await,
        SearchMode::Full => ctx.api.search_full(query, SEARCH_LIMIT).await,
    };

    let message = match result {
        Err(e) => {
            warn!(query, ?mode, error = %e, "Search failed");
            OutgoingMessage::html(format!(
                "{}\n\nPlease try again later.",
                views::failure("Search failed", &e)
            ))
        }
        Ok(results) if results.data.is_empty() => OutgoingMessage::html(views::no_results(query)),
        Ok(results) => {
            info!(query, ?mode, count = results.data.len(), "Search results");
            let message = OutgoingMessage::html(views::search_results(query, &results));
            match views::search_actions_keyboard(&results.data) {
                Some(keyboard) => message.with_keyboard(keyboard),
                None => message,
            }
        }
    };
    transport.send(chat_id, message).await
}

async fn lyrics(
    ctx: &BotContext,
    transport: &dyn ChatTransport,
    reply: Reply,
    title: &str,
) -> Result<()> {
    show_typing(transport, reply.chat_id()).await;
    match ctx.api.lyrics(title).await {
        Ok(lyrics) => send_plain_lyrics(transport, reply, title, &lyrics).await,
        Err(e) => {
            warn!(title, error = %e, "Lyrics lookup failed");
            let message = OutgoingMessage::html(format!(
                "{}\n\nPlease check the song title and try again.",
                views::failure("Failed to get lyrics", &e)
            ))
            .with_keyboard(views::retry_keyboard(
                "🔄 Try Another Song",
                &CallbackAction::SearchSong,
            ));
            deliver(transport, reply, message).await
        }
    }
}

async fn rich_lyrics(
    ctx: &BotContext,
    transport: &dyn ChatTransport,
    chat_id: ChatId,
    title: &str,
) -> Result<()> {
    show_typing(transport, chat_id).await;
    match ctx.api.rich_lyrics(title).await {
        Ok(lyrics) => send_rich_lyrics(transport, chat_id, &lyrics).await,
        Err(e) => {
            warn!(title, error = %e, "Rich lyrics lookup failed");
            let text = format!(
                "{}\n\nPlease check the song title and try again.",
                views::failure("Failed to get lyrics", &e)
            );
            send_html(transport, chat_id, &text).await
        }
    }
}

enum RandomPick {
    Song(String),
    Empty(String),
}

fn pick<T>(items: &[T]) -> Option<&T> {
    items.choose(&mut rand::thread_rng())
}

async fn pick_random_song(api: &dyn LyricsApi) -> Result<RandomPick, ApiError> {
    let artists = api.artists(RANDOM_ARTIST_SAMPLE).await?.data;
    let Some(artist) = pick(&artists) else {
        return Ok(RandomPick::Empty(views::NO_ARTISTS.to_string()));
    };

    let albums = api.artist_albums(&artist.title, ARTIST_ALBUMS_LIMIT).await?.data;
    let Some(album) = pick(&albums) else {
        return Ok(RandomPick::Empty(format!(
            "❌ No albums found for {}",
            encode_text(&artist.title)
        )));
    };

    let songs = api.album_songs(&album.title, 1).await?.data;
    Ok(songs.into_iter().next().map_or_else(
        || {
            RandomPick::Empty(format!(
                "❌ No songs found for {}",
                encode_text(&album.title)
            ))
        },
        |song| RandomPick::Song(song.title),
    ))
}

async fn random_lyrics(
    ctx: &BotContext,
    transport: &dyn ChatTransport,
    chat_id: ChatId,
) -> Result<()> {
    show_typing(transport, chat_id).await;
    match pick_random_song(ctx.api.as_ref()).await {
        Ok(RandomPick::Song(title)) => {
            info!(title, "Random song picked");
            rich_lyrics(ctx, transport, chat_id, &title).await
        }
        Ok(RandomPick::Empty(text)) => send_html(transport, chat_id, &text).await,
        Err(e) => {
            warn!(error = %e, "Random lyrics failed");
            send_html(
                transport,
                chat_id,
                &views::failure("Failed to get random lyrics", &e),
            )
            .await
        }
    }
}

async fn artists(ctx: &BotContext, transport: &dyn ChatTransport, chat_id: ChatId) -> Result<()> {
    show_typing(transport, chat_id).await;
    let text = match ctx.api.artists(ARTISTS_LIMIT).await {
        Ok(artists) if artists.data.is_empty() => "❌ No artists found.".to_string(),
        Ok(artists) => views::artists_list(&artists),
        Err(e) => {
            warn!(error = %e, "Artist listing failed");
            views::failure("Failed to get artists", &e)
        }
    };
    send_html(transport, chat_id, &text).await
}

async fn artist(
    ctx: &BotContext,
    transport: &dyn ChatTransport,
    reply: Reply,
    name: &str,
) -> Result<()> {
    show_typing(transport, reply.chat_id()).await;
    let message = match ctx.api.artist_albums(name, ARTIST_ALBUMS_LIMIT).await {
        Ok(albums) if albums.data.is_empty() => OutgoingMessage::html(views::no_albums(name))
            .with_keyboard(views::retry_keyboard(
                "🔄 Try Another Artist",
                &CallbackAction::SearchArtist,
            )),
        Ok(albums) => OutgoingMessage::html(views::artist_albums(name, &albums))
            .with_keyboard(views::albums_keyboard(name, &albums.data)),
        Err(e) => {
            warn!(artist = name, error = %e, "Album listing failed");
            OutgoingMessage::html(views::failure(
                &format!("Failed to get albums for '{}'", encode_text(name)),
                &e,
            ))
        }
    };
    deliver(transport, reply, message).await
}

async fn album(
    ctx: &BotContext,
    transport: &dyn ChatTransport,
    reply: Reply,
    path: &str,
) -> Result<()> {
    show_typing(transport, reply.chat_id()).await;
    let message = match ctx.api.album_songs(path, ALBUM_SONGS_LIMIT).await {
        Ok(songs) if songs.data.is_empty() => OutgoingMessage::html(views::no_songs(path))
            .with_keyboard(views::retry_keyboard(
                "🔄 Try Another Album",
                &CallbackAction::SearchAlbum,
            )),
        Ok(songs) => OutgoingMessage::html(views::album_songs(path, &songs))
            .with_keyboard(views::songs_keyboard(path, &songs.data)),
        Err(e) => {
            warn!(album = path, error = %e, "Song listing failed");
            OutgoingMessage::html(views::failure(
                &format!("Failed to get songs for '{}'", encode_text(path)),
                &e,
            ))
        }
    };
    deliver(transport, reply, message).await
}

async fn more_albums(
    ctx: &BotContext,
    transport: &dyn ChatTransport,
    reply: Reply,
    name: &str,
) -> Result<()> {
    let message = match ctx.api.artist_albums(name, ARTIST_ALBUMS_LIMIT).await {
        Ok(albums) => {
            let remaining = albums.data.len().saturating_sub(crate::config::LISTING_BUTTONS);
            OutgoingMessage::html(views::more_albums(name, remaining))
                .with_keyboard(views::more_albums_keyboard(&albums.data))
        }
        Err(e) => OutgoingMessage::html(views::failure(
            &format!("Failed to get albums for '{}'", encode_text(name)),
            &e,
        )),
    };
    deliver(transport, reply, message).await
}

async fn more_songs(
    ctx: &BotContext,
    transport: &dyn ChatTransport,
    reply: Reply,
    path: &str,
) -> Result<()> {
    let message = match ctx.api.album_songs(path, ALBUM_SONGS_LIMIT).await {
        Ok(songs) => {
            let remaining = songs.data.len().saturating_sub(crate::config::LISTING_BUTTONS);
            OutgoingMessage::html(views::more_songs(path, remaining))
                .with_keyboard(views::more_songs_keyboard(&songs.data))
        }
        Err(e) => OutgoingMessage::html(views::failure(
            &format!("Failed to get songs for '{}'", encode_text(path)),
            &e,
        )),
    };
    deliver(transport, reply, message).await
}
