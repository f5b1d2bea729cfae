//! Mezmur lyrics API
//!
//! The bot only consumes the API through the [`LyricsApi`] trait so that
//! handlers can be exercised without a running service.

mod client;
/// Wire models and title helpers
pub mod models;

pub use client::ApiClient;
pub use models::{
    display_name, Lyrics, Page, Paginated, RichLyrics, SearchResult, Song, TitleKind,
};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by the lyrics API client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connection, timeout or other transport failure
    #[error("network error: {0}")]
    Network(String),
    /// The API answered 404
    #[error("not found: {0}")]
    NotFound(String),
    /// Any other non-success status
    #[error("API error {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error detail from the body
        message: String,
    },
    /// The body could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),
    /// The request URL could not be built
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Remote content operations used by the bot
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LyricsApi: Send + Sync {
    /// Titles starting with `query`
    async fn search_prefix(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Paginated<SearchResult>, ApiError>;
    /// Titles or content matching `query` anywhere
    async fn search_full(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Paginated<SearchResult>, ApiError>;
    /// All artists
    async fn artists(&self, limit: u32) -> Result<Paginated<Page>, ApiError>;
    /// Albums of an artist
    async fn artist_albums(&self, artist: &str, limit: u32) -> Result<Paginated<Page>, ApiError>;
    /// Songs of an album, addressed by its `Artist/Album` path
    async fn album_songs(&self, album_title: &str, limit: u32)
        -> Result<Paginated<Page>, ApiError>;
    /// Plain lyrics of a song path
    async fn lyrics(&self, title: &str) -> Result<Lyrics, ApiError>;
    /// HTML lyrics of a song path
    async fn rich_lyrics(&self, title: &str) -> Result<RichLyrics, ApiError>;
    /// Service health document
    async fn health(&self) -> Result<Value, ApiError>;
}
