//! Pending menu input per user
//!
//! A menu button like "Search Artists" asks the user to type a name. The
//! tracker remembers that request until the next free-text message, which
//! is then routed to the matching command as its argument.

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// What the next free-text message of a user should be read as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingInput {
    /// An artist name for the artist lookup
    Artist,
    /// An `Artist/Album` path for the album lookup
    Album,
    /// A query for the song search
    SongQuery,
}

#[derive(Debug, Clone, Copy)]
struct PendingEntry {
    kind: PendingInput,
    set_at: Instant,
    generation: u64,
}

/// Per-user pending input, consumed by the first follow-up message
///
/// Entries expire after `ttl` so abandoned prompts do not accumulate.
#[derive(Clone)]
pub struct SessionTracker {
    pending: Cache<i64, PendingEntry>,
    ttl: Duration,
    /// Bumped by `clear_all`; entries from older generations are dead
    generation: Arc<AtomicU64>,
}

impl SessionTracker {
    /// Creates a tracker whose entries live at most `ttl`
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: Cache::builder().time_to_live(ttl).build(),
            ttl,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records the pending input for `user_id`, replacing any earlier one
    pub async fn set(&self, user_id: i64, kind: PendingInput) {
        debug!(user_id, ?kind, "Awaiting free-text input");
        let entry = PendingEntry {
            kind,
            set_at: Instant::now(),
            generation: self.generation.load(Ordering::Acquire),
        };
        self.pending.insert(user_id, entry).await;
    }

    /// Removes and returns the pending input for `user_id`
    ///
    /// This is the only way to read an entry, so each prompt is answered
    /// at most once. Read and removal are a single cache operation; an
    /// entry that is already expired or flushed is removed but not returned.
    pub async fn take(&self, user_id: i64) -> Option<PendingInput> {
        let entry = self.pending.remove(&user_id).await?;
        let live = entry.set_at.elapsed() < self.ttl
            && entry.generation == self.generation.load(Ordering::Acquire);
        live.then_some(entry.kind)
    }

    /// Drops the pending input for `user_id`, if any
    pub async fn clear(&self, user_id: i64) {
        self.pending.invalidate(&user_id).await;
    }

    /// Drops every pending input
    pub fn clear_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.pending.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> SessionTracker {
        SessionTracker::new(Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_take_returns_kind_exactly_once() {
        let sessions = tracker();
        sessions.set(12345, PendingInput::Artist).await;

        assert_eq!(sessions.take(12345).await, Some(PendingInput::Artist));
        assert_eq!(sessions.take(12345).await, None);
    }

    #[tokio::test]
    async fn test_set_overwrites_previous_kind() {
        let sessions = tracker();
        sessions.set(12345, PendingInput::Artist).await;
        sessions.set(12345, PendingInput::Album).await;

        assert_eq!(sessions.take(12345).await, Some(PendingInput::Album));
        assert_eq!(sessions.take(12345).await, None);
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let sessions = tracker();
        sessions.set(111, PendingInput::SongQuery).await;

        assert_eq!(sessions.take(222).await, None);
        assert_eq!(sessions.take(111).await, Some(PendingInput::SongQuery));
    }

    #[tokio::test]
    async fn test_clear_removes_entry() {
        let sessions = tracker();
        sessions.set(12345, PendingInput::Album).await;
        sessions.clear(12345).await;

        assert_eq!(sessions.take(12345).await, None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let sessions = SessionTracker::new(Duration::from_millis(50));
        sessions.set(12345, PendingInput::Artist).await;
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(sessions.take(12345).await, None);
    }

    #[tokio::test]
    async fn test_set_after_clear_all_is_live() {
        let sessions = tracker();
        sessions.set(12345, PendingInput::Artist).await;
        sessions.clear_all();
        sessions.set(12345, PendingInput::Album).await;

        assert_eq!(sessions.take(12345).await, Some(PendingInput::Album));
    }

    #[tokio::test]
    async fn test_concurrent_takes_answer_once() {
        let sessions = tracker();
        sessions.set(12345, PendingInput::SongQuery).await;

        let (a, b) = tokio::join!(sessions.take(12345), sessions.take(12345));
        assert_eq!(
            [a, b].iter().filter(|k| k.is_some()).count(),
            1,
            "one follow-up message consumes the prompt"
        );
    }

    #[tokio::test]
    async fn test_clear_all_drops_everyone() {
        let sessions = tracker();
        sessions.set(1, PendingInput::Artist).await;
        sessions.set(2, PendingInput::SongQuery).await;
        sessions.clear_all();

        assert_eq!(sessions.take(1).await, None);
        assert_eq!(sessions.take(2).await, None);
    }
}
