//! Inline search results cache and pagination window
//!
//! An inline query fetches its song list once; Telegram then asks for more
//! pages with an offset, which are served from the cached list.

use crate::api::{ApiError, Song};
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Song lists keyed by inline query text
///
/// A cached list is never modified; a fresh fetch replaces the whole entry.
#[derive(Clone)]
pub struct ResultPageCache {
    songs: Cache<String, Arc<Vec<Song>>>,
}

impl ResultPageCache {
    /// Creates a cache bounded by `max_queries` entries living at most `ttl`
    #[must_use]
    pub fn new(ttl: Duration, max_queries: u64) -> Self {
        Self {
            songs: Cache::builder()
                .max_capacity(max_queries)
                .time_to_live(ttl)
                .build(),
        }
    }

    fn key(query: &str) -> String {
        query.trim().to_string()
    }

    /// Returns the cached songs for `query`, running `fetch` only on a miss.
    ///
    /// Concurrent misses for the same query share one fetch. Failed fetches
    /// are not cached.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `fetch`.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        query: &str,
        fetch: F,
    ) -> Result<Arc<Vec<Song>>, ApiError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Vec<Song>, ApiError>>,
    {
        let key = Self::key(query);
        if let Some(songs) = self.songs.get(&key).await {
            debug!(query = %key, count = songs.len(), "Inline results served from cache");
            return Ok(songs);
        }

        let init = {
            let key = key.clone();
            async move { fetch(key).await.map(Arc::new) }
        };
        self.songs
            .try_get_with(key, init)
            .await
            .map_err(|e| (*e).clone())
    }

    /// Drops the cached songs for `query` and fetches them again.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `fetch`.
    pub async fn refresh<F, Fut>(&self, query: &str, fetch: F) -> Result<Arc<Vec<Song>>, ApiError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Vec<Song>, ApiError>>,
    {
        self.songs.invalidate(&Self::key(query)).await;
        self.get_or_fetch(query, fetch).await
    }

    /// Drops every cached query
    pub fn clear_all(&self) {
        self.songs.invalidate_all();
    }
}

/// Window `[offset, offset + page_size)` of `items`, clipped to its bounds,
/// plus the offset of the next page if anything remains after it.
///
/// # Examples
///
/// ```
/// use mezmur_bot::bot::page_cache::page;
/// let items: Vec<u32> = (0..12).collect();
/// assert_eq!(page(&items, 10, 5), (&items[10..], None));
/// ```
#[must_use]
pub fn page<T>(items: &[T], offset: usize, page_size: usize) -> (&[T], Option<usize>) {
    let start = offset.min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    let next = offset
        .checked_add(page_size)
        .filter(|next| *next < items.len());
    (&items[start..end], next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn songs(count: usize) -> Vec<Song> {
        (0..count)
            .filter_map(|i| Song::from_title(&format!("Artist/Album/Song {i}")))
            .collect()
    }

    #[test]
    fn test_page_windows_twelve_songs() {
        let list = songs(12);

        let (first, next) = page(&list, 0, 5);
        assert_eq!(first.len(), 5);
        assert_eq!(next, Some(5));

        let (second, next) = page(&list, 5, 5);
        assert_eq!(second.len(), 5);
        assert_eq!(second[0].name(), "Song 5");
        assert_eq!(next, Some(10));

        let (last, next) = page(&list, 10, 5);
        assert_eq!(last.len(), 2);
        assert_eq!(next, None);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let list = songs(3);
        let (rest, next) = page(&list, 7, 5);
        assert!(rest.is_empty());
        assert_eq!(next, None);
    }

    #[tokio::test]
    async fn test_fetch_runs_once_per_query() -> Result<(), ApiError> {
        let cache = ResultPageCache::new(Duration::from_secs(60), 100);
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let list = cache
                .get_or_fetch("samuel", |_| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(songs(12))
                })
                .await?;
            assert_eq!(list.len(), 12);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let other = calls.clone();
        cache
            .get_or_fetch("misale", |_| async move {
                other.fetch_add(1, Ordering::SeqCst);
                Ok(songs(2))
            })
            .await?;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() -> Result<(), ApiError> {
        let cache = ResultPageCache::new(Duration::from_secs(60), 100);

        let err = cache
            .get_or_fetch("samuel", |_| async {
                Err(ApiError::Network("connection refused".to_string()))
            })
            .await;
        assert!(err.is_err());

        let list = cache
            .get_or_fetch("samuel", |_| async { Ok(songs(4)) })
            .await?;
        assert_eq!(list.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_replaces_list() -> Result<(), ApiError> {
        let cache = ResultPageCache::new(Duration::from_secs(60), 100);
        let first = cache
            .get_or_fetch("samuel", |_| async { Ok(songs(4)) })
            .await?;
        let second = cache
            .refresh("samuel", |_| async { Ok(songs(9)) })
            .await?;

        assert_eq!(first.len(), 4);
        assert_eq!(second.len(), 9);
        Ok(())
    }

    #[tokio::test]
    async fn test_query_whitespace_is_ignored() -> Result<(), ApiError> {
        let cache = ResultPageCache::new(Duration::from_secs(60), 100);
        cache
            .get_or_fetch("samuel", |_| async { Ok(songs(3)) })
            .await?;
        let list = cache
            .get_or_fetch(" samuel ", |_| async {
                Err(ApiError::Network("should not refetch".to_string()))
            })
            .await?;
        assert_eq!(list.len(), 3);
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_following_next_offsets_covers_list(len in 0usize..60, size in 1usize..10) {
            let items: Vec<usize> = (0..len).collect();
            let mut seen = Vec::new();
            let mut offset = 0;
            loop {
                let (window, next) = page(&items, offset, size);
                prop_assert!(window.len() <= size);
                seen.extend_from_slice(window);
                match next {
                    Some(n) => {
                        prop_assert_eq!(n, offset + size);
                        offset = n;
                    }
                    None => break,
                }
            }
            prop_assert_eq!(seen, items);
        }
    }
}
