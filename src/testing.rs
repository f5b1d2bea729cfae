//! Testing helpers: an in-memory transport and mock constructors.

use crate::api::{ApiError, Lyrics, MockLyricsApi, Paginated, SearchResult};
use crate::bot::context::BotContext;
use crate::bot::transport::{ChatTransport, OutgoingMessage};
use crate::config::Settings;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use teloxide::types::{ChatId, MessageId};

/// One outbound call seen by [`RecordingTransport`]
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    /// `send`
    Sent(ChatId, OutgoingMessage),
    /// `edit`
    Edited(ChatId, MessageId, OutgoingMessage),
    /// `typing`
    Typing(ChatId),
}

/// Transport that keeps every call instead of talking to Telegram
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Recorded>>,
}

impl RecordingTransport {
    fn push(&self, call: Recorded) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    /// All calls in order
    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Texts of sent messages
    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Recorded::Sent(_, msg) => Some(msg.text),
                _ => None,
            })
            .collect()
    }

    /// Texts of edited messages
    pub fn edits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Recorded::Edited(_, _, msg) => Some(msg.text),
                _ => None,
            })
            .collect()
    }

    /// Texts of sent or edited messages, in order
    pub fn message_texts(&self) -> Vec<String> {
        self.messages().into_iter().map(|msg| msg.text).collect()
    }

    /// Sent or edited messages, in order
    pub fn messages(&self) -> Vec<OutgoingMessage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Recorded::Sent(_, msg) | Recorded::Edited(_, _, msg) => Some(msg),
                Recorded::Typing(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send(&self, chat_id: ChatId, message: OutgoingMessage) -> Result<()> {
        self.push(Recorded::Sent(chat_id, message));
        Ok(())
    }

    async fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        message: OutgoingMessage,
    ) -> Result<()> {
        self.push(Recorded::Edited(chat_id, message_id, message));
        Ok(())
    }

    async fn typing(&self, chat_id: ChatId) -> Result<()> {
        self.push(Recorded::Typing(chat_id));
        Ok(())
    }
}

/// Paginated envelope with one page of `data`
pub fn paginated<T>(data: Vec<T>, total: u64, has_next: bool) -> Paginated<T> {
    Paginated {
        data,
        total,
        page: 1,
        limit: 10,
        has_next,
        has_prev: false,
        next_token: None,
    }
}

/// Search hit with only a title
pub fn hit(title: &str) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        pageid: 0,
        snippet: None,
        size: None,
        wordcount: None,
    }
}

/// Mock API whose prefix search returns `titles` and whose lyrics lookup
/// answers every song with a short body.
pub fn mock_api_with_songs(titles: &'static [&'static str]) -> MockLyricsApi {
    let mut api = MockLyricsApi::new();
    api.expect_search_prefix().returning(move |_, _| {
        let hits: Vec<SearchResult> = titles.iter().map(|t| hit(t)).collect();
        let total = hits.len() as u64;
        Ok(paginated(hits, total, false))
    });
    api.expect_lyrics().returning(|title| {
        if title.contains("Broken") {
            return Err(ApiError::Status {
                status: 500,
                message: "boom".to_string(),
            });
        }
        Ok(Lyrics {
            title: title.rsplit('/').next().map(str::to_string),
            artist: title.split('/').next().map(str::to_string),
            album: None,
            lyrics: Some("Hallelujah".to_string()),
        })
    });
    api
}

/// Settings with a dummy token and default tuning
pub fn settings() -> Settings {
    Settings {
        telegram_bot_token: "dummy".to_string(),
        api_base_url: "http://localhost:8000".to_string(),
        api_timeout_secs: 5,
        bot_username: "mezmurlybot".to_string(),
        session_ttl_secs: 60,
        search_cache_ttl_secs: 60,
        search_cache_max_queries: 100,
    }
}

/// Context around a mocked API
pub fn context(api: MockLyricsApi) -> BotContext {
    BotContext::new(Arc::new(api), &settings())
}
