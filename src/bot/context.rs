//! Process-wide state handed to every handler

use crate::api::{ApiClient, ApiError, LyricsApi};
use crate::bot::page_cache::ResultPageCache;
use crate::bot::session::SessionTracker;
use crate::config::Settings;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Lyrics API handle plus the two in-memory maps
///
/// Built once at startup and shared behind an `Arc` by the dispatcher.
pub struct BotContext {
    /// Remote lyrics service
    pub api: Arc<dyn LyricsApi>,
    /// Pending menu input per user
    pub sessions: SessionTracker,
    /// Song lists of recent inline queries
    pub page_cache: ResultPageCache,
    /// Handle shown in the quick search hint, without `@`
    pub bot_username: String,
}

impl BotContext {
    /// Creates a context around an existing API implementation
    #[must_use]
    pub fn new(api: Arc<dyn LyricsApi>, settings: &Settings) -> Self {
        Self {
            api,
            sessions: SessionTracker::new(Duration::from_secs(settings.session_ttl_secs)),
            page_cache: ResultPageCache::new(
                Duration::from_secs(settings.search_cache_ttl_secs),
                settings.search_cache_max_queries,
            ),
            bot_username: settings.bot_username.clone(),
        }
    }

    /// Creates a context backed by the HTTP client for `settings.api_base_url`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if the base URL cannot be parsed.
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        let client = ApiClient::new(
            &settings.api_base_url,
            Duration::from_secs(settings.api_timeout_secs),
        )?;
        Ok(Self::new(Arc::new(client), settings))
    }

    /// Drops all pending inputs and cached inline results
    pub fn shutdown(&self) {
        self.sessions.clear_all();
        self.page_cache.clear_all();
        info!("Session and search caches flushed.");
    }
}
