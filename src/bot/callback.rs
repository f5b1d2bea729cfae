//! Inline button payloads
//!
//! Every button the bot renders carries a [`CallbackAction`] encoded as
//! `tag` or `tag:argument`. Incoming callback data is decoded once in the
//! dispatcher and then handled by an exhaustive match.

use crate::config::TELEGRAM_CALLBACK_DATA_LIMIT;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Action requested by an inline button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Show albums of an artist
    Artist(String),
    /// Show songs of an `Artist/Album` path
    Album(String),
    /// Show plain lyrics of a song path
    Lyrics(String),
    /// List albums of an artist beyond the first page of buttons
    MoreAlbums(String),
    /// List songs of an album beyond the first page of buttons
    MoreSongs(String),
    /// Prompt for an artist name
    SearchArtist,
    /// Prompt for an album path
    SearchAlbum,
    /// Prompt for a song query
    SearchSong,
    /// Explain inline mode
    InlineSearch,
    /// Reset to the main menu
    BackToHome,
    /// Show lyrics of a random song
    RandomLyrics,
}

/// Callback data that does not name a known action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown callback data: {0:?}")]
pub struct UnknownCallback(pub String);

const ARTIST: &str = "artist";
const ALBUM: &str = "album";
const LYRICS: &str = "lyrics";
const MORE_ALBUMS: &str = "more_albums";
const MORE_SONGS: &str = "more_songs";
const SEARCH_ARTIST: &str = "search_artist";
const SEARCH_ALBUM: &str = "search_album";
const SEARCH_SONG: &str = "search_song";
const INLINE_SEARCH: &str = "inline_search";
const BACK_TO_HOME: &str = "back_to_home";
const RANDOM_LYRICS: &str = "random_lyrics";

impl CallbackAction {
    /// Encoded payload, or `None` if it exceeds Telegram's callback data limit
    #[must_use]
    pub fn payload(&self) -> Option<String> {
        let data = self.to_string();
        (data.len() <= TELEGRAM_CALLBACK_DATA_LIMIT).then_some(data)
    }
}

impl FromStr for CallbackAction {
    type Err = UnknownCallback;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        if let Some((tag, arg)) = data.split_once(':') {
            let arg = arg.to_string();
            return match tag {
                ARTIST => Ok(Self::Artist(arg)),
                ALBUM => Ok(Self::Album(arg)),
                LYRICS => Ok(Self::Lyrics(arg)),
                MORE_ALBUMS => Ok(Self::MoreAlbums(arg)),
                MORE_SONGS => Ok(Self::MoreSongs(arg)),
                _ => Err(UnknownCallback(data.to_string())),
            };
        }

        match data {
            SEARCH_ARTIST => Ok(Self::SearchArtist),
            SEARCH_ALBUM => Ok(Self::SearchAlbum),
            SEARCH_SONG => Ok(Self::SearchSong),
            INLINE_SEARCH => Ok(Self::InlineSearch),
            BACK_TO_HOME => Ok(Self::BackToHome),
            RANDOM_LYRICS => Ok(Self::RandomLyrics),
            _ => Err(UnknownCallback(data.to_string())),
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artist(name) => write!(f, "{ARTIST}:{name}"),
            Self::Album(path) => write!(f, "{ALBUM}:{path}"),
            Self::Lyrics(path) => write!(f, "{LYRICS}:{path}"),
            Self::MoreAlbums(name) => write!(f, "{MORE_ALBUMS}:{name}"),
            Self::MoreSongs(path) => write!(f, "{MORE_SONGS}:{path}"),
            Self::SearchArtist => f.write_str(SEARCH_ARTIST),
            Self::SearchAlbum => f.write_str(SEARCH_ALBUM),
            Self::SearchSong => f.write_str(SEARCH_SONG),
            Self::InlineSearch => f.write_str(INLINE_SEARCH),
            Self::BackToHome => f.write_str(BACK_TO_HOME),
            Self::RandomLyrics => f.write_str(RANDOM_LYRICS),
        }
    }
}
