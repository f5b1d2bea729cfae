//! Wire models of the Mezmur lyrics API.
//!
//! Titles are `/`-delimited paths: `Artist`, `Artist/Album` or
//! `Artist/Album/Song`. The number of separators tells them apart.

use serde::{Deserialize, Serialize};

/// Envelope shared by every list endpoint
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Paginated<T> {
    /// Entries of the current page
    pub data: Vec<T>,
    /// Total number of matches known to the API
    #[serde(default)]
    pub total: u64,
    /// Current page, 1-based
    #[serde(default = "first_page")]
    pub page: u32,
    /// Page size requested
    #[serde(default)]
    pub limit: u32,
    /// Whether another page exists
    #[serde(default)]
    pub has_next: bool,
    /// Whether a previous page exists
    #[serde(default)]
    pub has_prev: bool,
    /// Continuation token for wiki-style paging
    #[serde(default)]
    pub next_token: Option<String>,
}

const fn first_page() -> u32 {
    1
}

/// A single search hit
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SearchResult {
    /// Full title path
    pub title: String,
    /// Wiki page id
    #[serde(default)]
    pub pageid: u64,
    /// Highlighted excerpt (full-text search only)
    #[serde(default)]
    pub snippet: Option<String>,
    /// Page size in bytes
    #[serde(default)]
    pub size: Option<u64>,
    /// Word count of the page
    #[serde(default)]
    pub wordcount: Option<u64>,
}

/// An artist, album or song listing entry
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Page {
    /// Full title path
    pub title: String,
    /// Wiki page id
    #[serde(default)]
    pub pageid: u64,
    /// Wiki namespace
    #[serde(default)]
    pub namespace: i64,
    /// Artist name, when the API resolved it
    #[serde(default)]
    pub artist: Option<String>,
    /// Album name, when the API resolved it
    #[serde(default)]
    pub album: Option<String>,
}

/// Plain text lyrics of a song
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct Lyrics {
    /// Song title as returned by the API
    #[serde(default)]
    pub title: Option<String>,
    /// Performing artist
    #[serde(default)]
    pub artist: Option<String>,
    /// Album the song belongs to
    #[serde(default)]
    pub album: Option<String>,
    /// Lyrics body
    #[serde(default)]
    pub lyrics: Option<String>,
}

/// HTML lyrics of a song
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RichLyrics {
    /// Song title
    pub title: String,
    /// Rendered wiki HTML
    pub html_content: String,
    /// Performing artist
    #[serde(default)]
    pub artist: Option<String>,
    /// Album the song belongs to
    #[serde(default)]
    pub album: Option<String>,
    /// Wiki page id
    #[serde(default)]
    pub page_id: Option<u64>,
}

/// Level of a title path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleKind {
    /// No separator
    Artist,
    /// One separator
    Album,
    /// Two or more separators
    Song,
}

impl TitleKind {
    /// Classify a title by its separator count
    #[must_use]
    pub fn of(title: &str) -> Self {
        match title.matches('/').count() {
            0 => Self::Artist,
            1 => Self::Album,
            _ => Self::Song,
        }
    }
}

/// Last path segment of a title, i.e. the display name
#[must_use]
pub fn display_name(title: &str) -> &str {
    title.rsplit('/').next().unwrap_or(title)
}

/// A song-level search hit kept by the inline query cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    /// Full `Artist/Album/Song` path
    pub full_title: String,
    /// First path segment
    pub artist: String,
    /// Second path segment
    pub album: String,
}

impl Song {
    /// Build a song from a title path, `None` unless it is song-level
    #[must_use]
    pub fn from_title(title: &str) -> Option<Self> {
        if TitleKind::of(title) != TitleKind::Song {
            return None;
        }
        let mut segments = title.split('/');
        let artist = segments.next().unwrap_or_default().to_string();
        let album = segments.next().unwrap_or_default().to_string();
        Some(Self {
            full_title: title.to_string(),
            artist,
            album,
        })
    }

    /// Song name, the last path segment
    #[must_use]
    pub fn name(&self) -> &str {
        display_name(&self.full_title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_kind_by_separator_count() {
        assert_eq!(TitleKind::of("Samuel Tesfamichael"), TitleKind::Artist);
        assert_eq!(
            TitleKind::of("Samuel Tesfamichael/Misale Yeleleh"),
            TitleKind::Album
        );
        assert_eq!(
            TitleKind::of("Samuel Tesfamichael/Misale Yeleleh/Yekebere"),
            TitleKind::Song
        );
        assert_eq!(TitleKind::of("a/b/c/d"), TitleKind::Song);
    }

    #[test]
    fn test_song_from_title() {
        let song = Song::from_title("Samuel Tesfamichael/Misale Yeleleh/Yekebere");
        let song = song.expect("song-level title");
        assert_eq!(song.artist, "Samuel Tesfamichael");
        assert_eq!(song.album, "Misale Yeleleh");
        assert_eq!(song.name(), "Yekebere");

        assert!(Song::from_title("Samuel Tesfamichael/Misale Yeleleh").is_none());
    }

    #[test]
    fn test_paginated_defaults_missing_fields() -> Result<(), serde_json::Error> {
        let body = r#"{"data": [{"title": "Samuel Tesfamichael"}], "total": 1, "has_next": false}"#;
        let parsed: Paginated<SearchResult> = serde_json::from_str(body)?;
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.data[0].pageid, 0);
        assert_eq!(parsed.page, 1);
        assert!(!parsed.has_prev);
        Ok(())
    }
}
