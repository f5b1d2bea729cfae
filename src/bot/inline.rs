//! Inline query answers
//!
//! Typing `@bot query` in any chat lists matching songs with their lyrics as
//! the message to share. Results come in pages of [`INLINE_PAGE_SIZE`] from
//! the song list cached for the query; Telegram echoes `next_offset` back to
//! request the following page.

use crate::api::{ApiError, LyricsApi, Song};
use crate::bot::context::BotContext;
use crate::bot::messaging::truncated_lyrics_message;
use crate::bot::page_cache::page;
use crate::bot::views;
use crate::config::{INLINE_MIN_QUERY_CHARS, INLINE_PAGE_SIZE, INLINE_SEARCH_LIMIT};
use futures_util::future::join_all;
use teloxide::types::{
    InlineQueryResult, InlineQueryResultArticle, InputMessageContent, InputMessageContentText,
    ParseMode,
};
use tracing::{info, warn};

/// One page of inline results
#[derive(Debug, Clone)]
pub struct InlineAnswer {
    /// Articles in display order
    pub results: Vec<InlineQueryResult>,
    /// Offset Telegram should send for the next page
    pub next_offset: Option<String>,
}

/// Builds the page of results for `query` at `offset`
///
/// Returns `None` when the query should go unanswered: too short, no
/// songs, or the search failed. Offset `0` always fetches fresh results;
/// later offsets are served from the cached list.
pub async fn answer_query(ctx: &BotContext, query: &str, offset: &str) -> Option<InlineAnswer> {
    let query = query.trim();
    if query.chars().count() < INLINE_MIN_QUERY_CHARS {
        return None;
    }
    let offset: usize = offset.parse().unwrap_or(0);
    info!(query, offset, "Inline query");

    let api = ctx.api.clone();
    let fetch = move |q: String| async move { fetch_songs(api.as_ref(), &q).await };
    let songs = if offset == 0 {
        ctx.page_cache.refresh(query, fetch).await
    } else {
        ctx.page_cache.get_or_fetch(query, fetch).await
    };
    let songs = match songs {
        Ok(songs) if songs.is_empty() => {
            info!(query, "No songs for inline query");
            return None;
        }
        Ok(songs) => songs,
        Err(e) => {
            warn!(query, error = %e, "Inline search failed");
            return None;
        }
    };

    Some(render_page(ctx.api.as_ref(), &songs, offset).await)
}

async fn fetch_songs(api: &dyn LyricsApi, query: &str) -> Result<Vec<Song>, ApiError> {
    let results = api.search_prefix(query, INLINE_SEARCH_LIMIT).await?;
    let songs: Vec<Song> = results
        .data
        .iter()
        .filter_map(|r| Song::from_title(&r.title))
        .collect();
    info!(query, hits = results.data.len(), songs = songs.len(), "Inline songs fetched");
    Ok(songs)
}

async fn render_page(api: &dyn LyricsApi, songs: &[Song], offset: usize) -> InlineAnswer {
    let (window, next) = page(songs, offset, INLINE_PAGE_SIZE);

    let mut results: Vec<InlineQueryResult> = join_all(
        window
            .iter()
            .enumerate()
            .map(|(i, song)| song_article(api, song, format!("{offset}_{i}"))),
    )
    .await;

    if offset == 0 {
        if let Some(end) = next {
            results.push(load_more_article(offset, songs.len() - end));
        }
    }

    InlineAnswer {
        results,
        next_offset: next.map(|n| n.to_string()),
    }
}

async fn song_article(api: &dyn LyricsApi, song: &Song, id: String) -> InlineQueryResult {
    let text = match api.lyrics(&song.full_title).await {
        Ok(lyrics) => {
            let header = views::lyrics_header(
                lyrics.title.as_deref().unwrap_or_else(|| song.name()),
                Some(lyrics.artist.as_deref().unwrap_or(&song.artist)),
                lyrics.album.as_deref(),
            );
            truncated_lyrics_message(&header, lyrics.lyrics.as_deref().unwrap_or("No lyrics available"))
        }
        Err(e) => {
            warn!(title = %song.full_title, error = %e, "Inline lyrics unavailable");
            views::inline_fallback(song)
        }
    };

    article(
        id,
        format!("🎵 {}", song.name()),
        format!("by {}", song.artist),
        text,
    )
}

fn load_more_article(offset: usize, remaining: usize) -> InlineQueryResult {
    article(
        format!("loading_{offset}"),
        "⏳ Load More Songs".to_string(),
        format!("{remaining} more songs available - scroll down"),
        views::inline_load_more(remaining),
    )
}

fn article(id: String, title: String, description: String, text: String) -> InlineQueryResult {
    let content = InputMessageContent::Text(
        InputMessageContentText::new(text).parse_mode(ParseMode::Html),
    );
    InlineQueryResult::Article(InlineQueryResultArticle::new(id, title, content).description(description))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockLyricsApi;
    use crate::testing::{context, hit, mock_api_with_songs, paginated};

    const TWELVE: &[&str] = &[
        "Samuel Tesfamichael",
        "Samuel Tesfamichael/Misale Yeleleh",
        "Samuel Tesfamichael/Misale Yeleleh/Song 1",
        "Samuel Tesfamichael/Misale Yeleleh/Song 2",
        "Samuel Tesfamichael/Misale Yeleleh/Song 3",
        "Samuel Tesfamichael/Misale Yeleleh/Song 4",
        "Samuel Tesfamichael/Misale Yeleleh/Song 5",
        "Samuel Tesfamichael/Misale Yeleleh/Song 6",
        "Samuel Tesfamichael/Misale Yeleleh/Song 7",
        "Samuel Tesfamichael/Misale Yeleleh/Song 8",
        "Samuel Tesfamichael/Misale Yeleleh/Song 9",
        "Samuel Tesfamichael/Misale Yeleleh/Song 10",
        "Samuel Tesfamichael/Misale Yeleleh/Song 11",
        "Samuel Tesfamichael/Misale Yeleleh/Broken 12",
    ];

    fn ids(answer: &InlineAnswer) -> Vec<String> {
        answer
            .results
            .iter()
            .filter_map(|r| match r {
                InlineQueryResult::Article(a) => Some(a.id.clone()),
                _ => None,
            })
            .collect()
    }

    fn message_text(result: &InlineQueryResult) -> String {
        match result {
            InlineQueryResult::Article(a) => match &a.input_message_content {
                InputMessageContent::Text(t) => t.message_text.clone(),
                _ => String::new(),
            },
            _ => String::new(),
        }
    }

    #[tokio::test]
    async fn test_pages_through_twelve_songs() {
        let ctx = context(mock_api_with_songs(TWELVE));

        let Some(first) = answer_query(&ctx, "samuel", "0").await else {
            panic!("first page missing");
        };
        assert_eq!(ids(&first), vec!["0_0", "0_1", "0_2", "0_3", "0_4", "loading_0"]);
        assert_eq!(first.next_offset.as_deref(), Some("5"));
        assert!(message_text(&first.results[5]).contains("7 more songs available"));
        assert!(message_text(&first.results[0]).contains("Hallelujah"));

        let Some(second) = answer_query(&ctx, "samuel", "5").await else {
            panic!("second page missing");
        };
        assert_eq!(ids(&second), vec!["5_0", "5_1", "5_2", "5_3", "5_4"]);
        assert_eq!(second.next_offset.as_deref(), Some("10"));

        let Some(last) = answer_query(&ctx, "samuel", "10").await else {
            panic!("last page missing");
        };
        assert_eq!(ids(&last), vec!["10_0", "10_1"]);
        assert_eq!(last.next_offset, None);
    }

    #[tokio::test]
    async fn test_failed_lyrics_degrade_entry() {
        let ctx = context(mock_api_with_songs(TWELVE));
        let Some(last) = answer_query(&ctx, "samuel", "10").await else {
            panic!("last page missing");
        };

        let text = message_text(&last.results[1]);
        assert!(text.contains("❌ Lyrics temporarily unavailable"));
        assert!(text.contains("/lyrics Samuel Tesfamichael/Misale Yeleleh/Broken 12"));
    }

    #[tokio::test]
    async fn test_later_pages_come_from_cache() {
        let mut api = MockLyricsApi::new();
        api.expect_search_prefix().times(1).returning(|_, _| {
            Ok(paginated(
                (1..=8).map(|i| hit(&format!("A/B/Song {i}"))).collect(),
                8,
                false,
            ))
        });
        api.expect_lyrics().returning(|_| Ok(Default::default()));
        let ctx = context(api);

        assert!(answer_query(&ctx, "song", "0").await.is_some());
        let Some(next) = answer_query(&ctx, "song", "5").await else {
            panic!("second page missing");
        };
        assert_eq!(ids(&next), vec!["5_0", "5_1", "5_2"]);
    }

    #[tokio::test]
    async fn test_short_query_is_ignored() {
        let ctx = context(MockLyricsApi::new());
        assert!(answer_query(&ctx, "s", "0").await.is_none());
        assert!(answer_query(&ctx, "   ", "0").await.is_none());
    }

    #[tokio::test]
    async fn test_garbage_offset_means_first_page() {
        let ctx = context(mock_api_with_songs(TWELVE));
        let Some(answer) = answer_query(&ctx, "samuel", "abc").await else {
            panic!("page missing");
        };
        assert_eq!(answer.next_offset.as_deref(), Some("5"));
        assert!(ids(&answer).contains(&"loading_0".to_string()));
    }

    #[tokio::test]
    async fn test_no_songs_means_no_answer() {
        let mut api = MockLyricsApi::new();
        api.expect_search_prefix()
            .returning(|_, _| Ok(paginated(vec![hit("Samuel Tesfamichael")], 1, false)));
        let ctx = context(api);

        assert!(answer_query(&ctx, "samuel", "0").await.is_none());
    }
}
