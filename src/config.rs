//! Configuration and settings management
//!
//! Loads settings from environment variables and defines tuning constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_bot_token: String,

    /// Base URL of the Mezmur lyrics API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Request timeout for the lyrics API
    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: u64,

    /// Public bot handle, shown in the quick search hint
    #[serde(default = "default_bot_username")]
    pub bot_username: String,

    /// How long a pending menu input survives without a follow-up message
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// How long fetched inline search results are kept
    #[serde(default = "default_search_cache_ttl_secs")]
    pub search_cache_ttl_secs: u64,

    /// Maximum number of distinct inline queries kept in memory
    #[serde(default = "default_search_cache_max_queries")]
    pub search_cache_max_queries: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

const fn default_api_timeout_secs() -> u64 {
    30
}

fn default_bot_username() -> String {
    "mezmurlybot".to_string()
}

const fn default_session_ttl_secs() -> u64 {
    3600
}

const fn default_search_cache_ttl_secs() -> u64 {
    1800
}

const fn default_search_cache_max_queries() -> u64 {
    1000
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mezmur_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the bot token is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Plain env vars; UPPER_SNAKE_CASE maps to snake_case, empty means unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        if settings.telegram_bot_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }
        settings.api_base_url = settings.api_base_url.trim_end_matches('/').to_string();

        Ok(settings)
    }
}

// Inline query pagination
/// Entries per inline answer page
pub const INLINE_PAGE_SIZE: usize = 5;
/// How many prefix matches are fetched once per inline query
pub const INLINE_SEARCH_LIMIT: u32 = 50;
/// Seconds Telegram may cache an inline answer
pub const INLINE_CACHE_TIME_SECS: u32 = 300;
/// Inline queries shorter than this are ignored
pub const INLINE_MIN_QUERY_CHARS: usize = 2;

// Command listings
/// Results fetched for `/search` and `/search_full`
pub const SEARCH_LIMIT: u32 = 10;
/// Artists fetched for `/artists`
pub const ARTISTS_LIMIT: u32 = 20;
/// Albums fetched for an artist
pub const ARTIST_ALBUMS_LIMIT: u32 = 20;
/// Songs fetched for an album
pub const ALBUM_SONGS_LIMIT: u32 = 20;
/// Buttons shown under a listing before a "show more" button
pub const LISTING_BUTTONS: usize = 5;
/// Buttons shown on a "show more" page
pub const MORE_BUTTONS: usize = 10;
/// Artists sampled by `/random_lyrics`
pub const RANDOM_ARTIST_SAMPLE: u32 = 4;

// Telegram limits
/// Maximum message length with a safety margin below the official 4096
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4000;
/// Length kept when a single message has to be truncated
pub const TELEGRAM_TRUNCATED_LENGTH: usize = 3900;
/// Maximum callback payload size in bytes
pub const TELEGRAM_CALLBACK_DATA_LIMIT: usize = 64;

// Telegram API retry
/// Initial backoff for Telegram API retries
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Maximum backoff for Telegram API retries
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
/// Maximum attempts for Telegram API operations
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Both scenarios live in one test to avoid env var races between threads
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("TELEGRAM_BOT_TOKEN", "dummy_token");
        env::set_var("API_BASE_URL", "http://api.test/");
        env::set_var("SESSION_TTL_SECS", "42");

        let settings = Settings::new()?;
        assert_eq!(settings.telegram_bot_token, "dummy_token");
        assert_eq!(settings.api_base_url, "http://api.test");
        assert_eq!(settings.session_ttl_secs, 42);
        assert_eq!(settings.search_cache_max_queries, 1000);
        assert_eq!(settings.bot_username, "mezmurlybot");

        env::remove_var("API_BASE_URL");
        env::remove_var("SESSION_TTL_SECS");

        let settings = Settings::new()?;
        assert_eq!(settings.api_base_url, "http://localhost:8000");

        env::set_var("TELEGRAM_BOT_TOKEN", "");
        assert!(Settings::new().is_err());

        env::remove_var("TELEGRAM_BOT_TOKEN");
        assert!(Settings::new().is_err());
        Ok(())
    }
}
