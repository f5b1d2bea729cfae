//! Texts and inline keyboards
//!
//! Everything user-visible is rendered here in Telegram HTML. Strings that
//! come from the lyrics API are escaped before they are embedded.

use crate::api::{display_name, ApiError, Page, Paginated, SearchResult, Song, TitleKind};
use crate::bot::callback::CallbackAction;
use crate::config::{LISTING_BUTTONS, MORE_BUTTONS};
use html_escape::encode_text;
use std::fmt::Write as _;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::warn;

// ─────────────────────────────────────────────────────────────────────────────
// Fixed texts
// ─────────────────────────────────────────────────────────────────────────────

/// Welcome shown by `/start` and the home button
pub const WELCOME: &str = "🎵 <b>Welcome to Mezmur Bot!</b> 🎵

I can help you find Ethiopian gospel song lyrics. Pick an option below or use a command:

🔍 <b>Search Commands:</b>
• <code>/search &lt;query&gt;</code> - Fast search for titles starting with your query
• <code>/search_full &lt;query&gt;</code> - Broader search that looks anywhere in content

🎵 <b>Lyrics Commands:</b>
• <code>/lyrics &lt;song_title&gt;</code> - Get plain text lyrics
• <code>/rich_lyrics &lt;song_title&gt;</code> - Get lyrics with formatting
• <code>/random_lyrics</code> - Get random lyrics

👤 <b>Artist &amp; Album Commands:</b>
• <code>/artist &lt;artist_name&gt;</code> - Get albums by an artist
• <code>/album &lt;album_title&gt;</code> - Get songs in an album
• <code>/artists</code> - List all available artists

<b>Examples:</b>
• <code>/search samuel tesfa</code>
• <code>/artist Samuel Tesfamichael</code>
• <code>/lyrics Samuel Tesfamichael/Misale Yeleleh/Yekebere</code>";

/// Reply to `/help`
pub const HELP: &str = "📖 <b>Mezmur Bot Help</b> 📖

<b>Search Commands:</b>
🔍 <code>/search &lt;query&gt;</code> - Fast prefix search
🔍 <code>/search_full &lt;query&gt;</code> - Full text search

<b>Lyrics Commands:</b>
🎵 <code>/lyrics &lt;song_title&gt;</code> - Plain text lyrics
🎵 <code>/rich_lyrics &lt;song_title&gt;</code> - Formatted lyrics
🎵 <code>/random_lyrics</code> - Random song lyrics

<b>Artist &amp; Album Commands:</b>
👤 <code>/artist &lt;artist_name&gt;</code> - Artist's albums
💿 <code>/album &lt;album_title&gt;</code> - Album's songs
👥 <code>/artists</code> - List all artists

<b>Song Title Format:</b>
<code>Artist/Album/Song</code>
Example: <code>Samuel Tesfamichael/Misale Yeleleh/Yekebere</code>";

/// Free text that mentions a known artist or album
pub const KEYWORD_HINT: &str = "🔍 I detected you might be looking for music!

Try these commands:
• <code>/search samuel tesfa</code> - Search for Samuel Tesfamichael
• <code>/search misale</code> - Search for Misale Yeleleh
• <code>/artist Samuel Tesfamichael</code> - Get the artist's albums

Type <code>/help</code> for more commands!";

/// Free text with nothing pending and no known keyword
pub const GREETING: &str = "👋 Hi! I'm Mezmur Bot, your Ethiopian gospel music assistant.

Type <code>/start</code> to see what I can do, or <code>/help</code> for command help!";

/// Prompt after the "Search Artists" button
pub const PROMPT_ARTIST: &str = "👤 <b>Search Artists</b>

Type the name of the artist you're looking for.
Example: <code>Samuel Tesfamichael</code>";

/// Prompt after the "Search Albums" button
pub const PROMPT_ALBUM: &str = "💿 <b>Search Albums</b>

Type the album as <code>Artist/Album</code>.
Example: <code>Samuel Tesfamichael/Misale Yeleleh</code>";

/// Prompt after the "Search Songs" button
pub const PROMPT_SONG: &str = "🎵 <b>Search Songs</b>

Type the beginning of a song, album or artist name.
Example: <code>samuel tesfa</code>";

/// Words that trigger [`KEYWORD_HINT`]
pub const MUSIC_KEYWORDS: &[&str] = &["samuel", "tesfamichael", "misale", "yeleleh"];

/// Usage text of `/search`
pub const USAGE_SEARCH: &str = "🔍 <b>Search Command</b>

Usage: <code>/search &lt;query&gt;</code>
Example: <code>/search samuel tesfa</code>

This performs a fast prefix search for titles starting with your query.";

/// Usage text of `/search_full`
pub const USAGE_SEARCH_FULL: &str = "🔍 <b>Full Search Command</b>

Usage: <code>/search_full &lt;query&gt;</code>
Example: <code>/search_full misale</code>

This performs a broader search that looks anywhere in content.";

/// Usage text of `/lyrics`
pub const USAGE_LYRICS: &str = "🎵 <b>Lyrics Command</b>

Usage: <code>/lyrics &lt;song_title&gt;</code>
Example: <code>/lyrics Samuel Tesfamichael/Misale Yeleleh/Yekebere</code>

Get the lyrics for a specific song.";

/// Usage text of `/rich_lyrics`
pub const USAGE_RICH_LYRICS: &str = "🎵 <b>Rich Lyrics Command</b>

Usage: <code>/rich_lyrics &lt;song_title&gt;</code>
Example: <code>/rich_lyrics Samuel Tesfamichael/Misale Yeleleh/Yekebere</code>

Get the lyrics with their original formatting.";

/// Usage text of `/artist`
pub const USAGE_ARTIST: &str = "👤 <b>Artist Command</b>

Usage: <code>/artist &lt;artist_name&gt;</code>
Example: <code>/artist Samuel Tesfamichael</code>

Get all albums by a specific artist.";

/// Usage text of `/album`
pub const USAGE_ALBUM: &str = "💿 <b>Album Command</b>

Usage: <code>/album &lt;album_title&gt;</code>
Example: <code>/album Samuel Tesfamichael/Misale Yeleleh</code>

Get all songs in a specific album.";

/// Shown when the random pick finds no artists
pub const NO_ARTISTS: &str = "❌ No artists found. Please try again later.";

const LYRICS_SEPARATOR_WIDTH: usize = 30;

// ─────────────────────────────────────────────────────────────────────────────
// Keyboards
// ─────────────────────────────────────────────────────────────────────────────

/// Button for `action`, or `None` if its payload is too long for Telegram
fn button(label: impl Into<String>, action: &CallbackAction) -> Option<InlineKeyboardButton> {
    match action.payload() {
        Some(data) => Some(InlineKeyboardButton::callback(label, data)),
        None => {
            warn!(%action, "Callback payload exceeds Telegram limit; button skipped");
            None
        }
    }
}

fn home_button() -> InlineKeyboardButton {
    InlineKeyboardButton::callback("🏠 Back to Home", CallbackAction::BackToHome.to_string())
}

/// Main menu under the welcome text
#[must_use]
pub fn main_menu_keyboard() -> InlineKeyboardMarkup {
    let fixed = |label: &str, action: CallbackAction| {
        InlineKeyboardButton::callback(label.to_string(), action.to_string())
    };
    InlineKeyboardMarkup::new(vec![
        vec![
            fixed("🔍 Search Songs", CallbackAction::SearchSong),
            fixed("⚡ Quick Search", CallbackAction::InlineSearch),
        ],
        vec![
            fixed("👤 Search Artists", CallbackAction::SearchArtist),
            fixed("💿 Search Albums", CallbackAction::SearchAlbum),
        ],
        vec![fixed("🎲 Random Lyrics", CallbackAction::RandomLyrics)],
    ])
}

/// Single home button
#[must_use]
pub fn home_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![home_button()]])
}

/// "Try again" plus home, offered after an empty lookup or a failed lyrics fetch
#[must_use]
pub fn retry_keyboard(label: &str, retry: &CallbackAction) -> InlineKeyboardMarkup {
    let row: Vec<InlineKeyboardButton> = button(label.to_string(), retry)
        .into_iter()
        .chain(std::iter::once(home_button()))
        .collect();
    InlineKeyboardMarkup::new(vec![row])
}

/// Switch-inline button for quick search
#[must_use]
pub fn quick_search_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::switch_inline_query_current_chat(
            "⚡ Start Quick Search",
            "",
        )],
        vec![home_button()],
    ])
}

/// One button per search hit, at most [`LISTING_BUTTONS`]
#[must_use]
pub fn search_actions_keyboard(results: &[SearchResult]) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<Vec<InlineKeyboardButton>> = results
        .iter()
        .take(LISTING_BUTTONS)
        .filter_map(|result| {
            let name = display_name(&result.title);
            let (label, action) = match TitleKind::of(&result.title) {
                TitleKind::Artist => (
                    format!("👤 {name}"),
                    CallbackAction::Artist(result.title.clone()),
                ),
                TitleKind::Album => (
                    format!("💿 {name}"),
                    CallbackAction::Album(result.title.clone()),
                ),
                TitleKind::Song => (
                    format!("🎵 {name}"),
                    CallbackAction::Lyrics(result.title.clone()),
                ),
            };
            button(label, &action).map(|b| vec![b])
        })
        .collect();
    (!rows.is_empty()).then(|| InlineKeyboardMarkup::new(rows))
}

/// Album buttons for an artist listing, with "more" and home rows
#[must_use]
pub fn albums_keyboard(artist: &str, albums: &[Page]) -> InlineKeyboardMarkup {
    let mut rows = listing_rows(albums.iter().take(LISTING_BUTTONS), album_button);
    if albums.len() > LISTING_BUTTONS {
        rows.extend(
            button(
                "📄 Show More Albums",
                &CallbackAction::MoreAlbums(artist.to_string()),
            )
            .map(|b| vec![b]),
        );
    }
    rows.push(vec![home_button()]);
    InlineKeyboardMarkup::new(rows)
}

/// Song buttons for an album listing, with "more" and home rows
#[must_use]
pub fn songs_keyboard(album: &str, songs: &[Page]) -> InlineKeyboardMarkup {
    let mut rows = listing_rows(songs.iter().take(LISTING_BUTTONS), song_button);
    if songs.len() > LISTING_BUTTONS {
        rows.extend(
            button(
                "📄 Show More Songs",
                &CallbackAction::MoreSongs(album.to_string()),
            )
            .map(|b| vec![b]),
        );
    }
    rows.push(vec![home_button()]);
    InlineKeyboardMarkup::new(rows)
}

/// Buttons for albums past the first [`LISTING_BUTTONS`]
#[must_use]
pub fn more_albums_keyboard(albums: &[Page]) -> InlineKeyboardMarkup {
    let mut rows = listing_rows(
        albums.iter().skip(LISTING_BUTTONS).take(MORE_BUTTONS),
        album_button,
    );
    rows.push(vec![home_button()]);
    InlineKeyboardMarkup::new(rows)
}

/// Buttons for songs past the first [`LISTING_BUTTONS`]
#[must_use]
pub fn more_songs_keyboard(songs: &[Page]) -> InlineKeyboardMarkup {
    let mut rows = listing_rows(
        songs.iter().skip(LISTING_BUTTONS).take(MORE_BUTTONS),
        song_button,
    );
    rows.push(vec![home_button()]);
    InlineKeyboardMarkup::new(rows)
}

fn album_button(album: &Page) -> Option<InlineKeyboardButton> {
    button(
        format!("💿 {}", display_name(&album.title)),
        &CallbackAction::Album(album.title.clone()),
    )
}

fn song_button(song: &Page) -> Option<InlineKeyboardButton> {
    button(
        format!("🎵 {}", display_name(&song.title)),
        &CallbackAction::Lyrics(song.title.clone()),
    )
}

fn listing_rows<'a>(
    pages: impl Iterator<Item = &'a Page>,
    make: fn(&Page) -> Option<InlineKeyboardButton>,
) -> Vec<Vec<InlineKeyboardButton>> {
    pages.filter_map(make).map(|b| vec![b]).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendered texts
// ─────────────────────────────────────────────────────────────────────────────

/// `❌ {action}: {reason}` reply for a failed API call
#[must_use]
pub fn failure(action: &str, err: &ApiError) -> String {
    format!("❌ {action}: {}", encode_text(&err.to_string()))
}

/// Quick search explanation with the bot handle
#[must_use]
pub fn quick_search(bot_username: &str) -> String {
    format!(
        "⚡ <b>Quick Search Mode</b>\n\n\
         Type <code>@{name} song name</code> in any chat to search songs instantly.\n\
         Pick a result to share its lyrics, and scroll down to load more songs.\n\n\
         Or tap the button below to start right here.",
        name = encode_text(bot_username)
    )
}

/// No hits for a `/search` or `/search_full` query
#[must_use]
pub fn no_results(query: &str) -> String {
    format!(
        "❌ No results found for '{}'\n\n\
         Try a different search term or use <code>/search_full</code> for a broader search.",
        encode_text(query)
    )
}

/// Search hits grouped by level
#[must_use]
pub fn search_results(query: &str, results: &Paginated<SearchResult>) -> String {
    let mut artists = String::new();
    let mut albums = String::new();
    let mut songs = String::new();

    for result in &results.data {
        let title = &result.title;
        match TitleKind::of(title) {
            TitleKind::Artist => {
                let _ = writeln!(artists, "• {}", encode_text(title));
            }
            TitleKind::Album => {
                let artist = title.split('/').next().unwrap_or_default();
                let _ = writeln!(
                    albums,
                    "• {} (by {})",
                    encode_text(display_name(title)),
                    encode_text(artist)
                );
            }
            TitleKind::Song => {
                let artist = title.split('/').next().unwrap_or_default();
                let _ = writeln!(
                    songs,
                    "• {} (by {})",
                    encode_text(display_name(title)),
                    encode_text(artist)
                );
            }
        }
    }

    let mut message = format!("🔍 <b>Search Results for '{}'</b>\n", encode_text(query));
    for (heading, body) in [
        ("👤 <b>ARTISTS</b>", artists),
        ("💿 <b>ALBUMS</b>", albums),
        ("🎵 <b>SONGS</b>", songs),
    ] {
        if !body.is_empty() {
            let _ = write!(message, "\n{heading}\n{body}");
        }
    }
    if results.has_next {
        let _ = write!(
            message,
            "\n📄 Showing {} of {} results",
            results.data.len(),
            results.total
        );
    }
    message.trim_end().to_string()
}

/// Numbered artist directory for `/artists`
#[must_use]
pub fn artists_list(artists: &Paginated<Page>) -> String {
    let mut message = String::from("👤 <b>Available Artists:</b>\n\n");
    for (i, artist) in artists.data.iter().enumerate() {
        let _ = writeln!(message, "{}. {}", i + 1, encode_text(&artist.title));
    }
    if artists.has_next {
        let _ = write!(
            message,
            "\n📄 Showing {} of {} artists",
            artists.data.len(),
            artists.total
        );
    }
    message.trim_end().to_string()
}

/// Numbered album list of an artist
#[must_use]
pub fn artist_albums(artist: &str, albums: &Paginated<Page>) -> String {
    let mut message = format!("👤 <b>{}</b>\n\n💿 <b>Albums:</b>\n\n", encode_text(artist));
    numbered(&mut message, &albums.data);
    if albums.has_next {
        let _ = write!(
            message,
            "\n📄 Showing {} of {} albums",
            albums.data.len(),
            albums.total
        );
    }
    message.trim_end().to_string()
}

/// Numbered song list of an album
#[must_use]
pub fn album_songs(album: &str, songs: &Paginated<Page>) -> String {
    let mut message = format!(
        "💿 <b>{}</b>\n\n🎵 <b>Songs:</b>\n\n",
        encode_text(display_name(album))
    );
    numbered(&mut message, &songs.data);
    if songs.has_next {
        let _ = write!(
            message,
            "\n📄 Showing {} of {} songs",
            songs.data.len(),
            songs.total
        );
    }
    message.trim_end().to_string()
}

fn numbered(message: &mut String, pages: &[Page]) {
    for (i, page) in pages.iter().enumerate() {
        let _ = writeln!(message, "{}. {}", i + 1, encode_text(display_name(&page.title)));
    }
}

/// Heading for the albums past the first buttons
#[must_use]
pub fn more_albums(artist: &str, remaining: usize) -> String {
    if remaining == 0 {
        return format!(
            "📄 <b>More Albums by {}</b>\n\nNo more albums to show.",
            encode_text(artist)
        );
    }
    format!(
        "📄 <b>More Albums by {}</b>\n\nChoose an album:",
        encode_text(artist)
    )
}

/// Heading for the songs past the first buttons
#[must_use]
pub fn more_songs(album: &str, remaining: usize) -> String {
    if remaining == 0 {
        return format!(
            "📄 <b>More Songs from {}</b>\n\nNo more songs to show.",
            encode_text(display_name(album))
        );
    }
    format!(
        "📄 <b>More Songs from {}</b>\n\nChoose a song:",
        encode_text(display_name(album))
    )
}

/// Empty album list of an artist
#[must_use]
pub fn no_albums(artist: &str) -> String {
    format!(
        "❌ No albums found for '{}'\n\n\
         Please check the artist name and try again.\n\n\
         You can search for another artist or go back to the main menu.",
        encode_text(artist)
    )
}

/// Empty song list of an album
#[must_use]
pub fn no_songs(album: &str) -> String {
    format!(
        "❌ No songs found for '{}'\n\n\
         Please check the album title and try again.\n\n\
         You can search for another album or go back to the main menu.",
        encode_text(album)
    )
}

/// Title, artist and album lines above a lyrics body
#[must_use]
pub fn lyrics_header(title: &str, artist: Option<&str>, album: Option<&str>) -> String {
    let mut header = format!("🎵 <b>{}</b>\n", encode_text(title));
    if let Some(artist) = artist.filter(|a| !a.is_empty()) {
        let _ = writeln!(header, "👤 by {}", encode_text(artist));
    }
    if let Some(album) = album.filter(|a| !a.is_empty()) {
        let _ = writeln!(header, "💿 from {}", encode_text(album));
    }
    header
}

/// Header, separator and escaped lyrics body in one message
#[must_use]
pub fn lyrics_message(header: &str, body: &str) -> String {
    format!(
        "{header}\n{}\n\n{}",
        "=".repeat(LYRICS_SEPARATOR_WIDTH),
        encode_text(body)
    )
}

/// Inline result text when a song's lyrics could not be fetched
#[must_use]
pub fn inline_fallback(song: &Song) -> String {
    format!(
        "🎵 <b>{}</b>\n👤 by {}\n\n❌ Lyrics temporarily unavailable\n\
         Use <code>/lyrics {}</code> to try again!",
        encode_text(song.name()),
        encode_text(&song.artist),
        encode_text(&song.full_title)
    )
}

/// Inline "load more" entry text
#[must_use]
pub fn inline_load_more(remaining: usize) -> String {
    format!(
        "⏳ <b>Load More Songs</b>\n\n📊 {remaining} more songs available\n\
         🔄 Scroll down to load more results"
    )
}
