//! Document store abstraction used by the trending jobs.
//!
//! Three collections are involved: search events (append-only), catalog
//! entries keyed by slug, and clubs. Every multi-document mutation goes
//! through an atomic batch bounded by [`MAX_BATCH_WRITES`].

mod sqlite;
mod types;

pub use sqlite::SqliteStore;
pub use types::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Append-only collection of search events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Record a search, returns the assigned id.
    async fn record(&self, query: &str, timestamp: DateTime<Utc>) -> Result<i64, StoreError>;

    /// All events with `timestamp >= threshold`, oldest first. Unbounded.
    async fn events_since(&self, threshold: DateTime<Utc>) -> Result<Vec<SearchEvent>, StoreError>;

    /// Up to `limit` events with `timestamp < cutoff`, oldest first.
    async fn events_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SearchEvent>, StoreError>;

    /// Delete the given events in one atomic batch, returns how many rows went away.
    async fn delete_batch(&self, ids: &[i64]) -> Result<usize, StoreError>;

    /// Total number of stored events.
    async fn count(&self) -> Result<u64, StoreError>;
}

/// Book catalog keyed by slug.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert or fully replace an entry.
    async fn upsert_entry(&self, entry: &CatalogEntry) -> Result<(), StoreError>;

    /// Get an entry, `NotFound` if missing.
    async fn get_entry(&self, slug: &str) -> Result<CatalogEntry, StoreError>;

    /// Exact, case-sensitive slug lookup (limit 1).
    async fn find_by_slug(&self, slug: &str) -> Result<Option<CatalogEntry>, StoreError>;

    /// Entries with `trending_score > min_score`, highest first, at most `limit`.
    async fn entries_above(
        &self,
        min_score: f64,
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, StoreError>;

    /// Entries ordered by `search_score_24h` descending, at most `limit`.
    async fn top_by_search_score(&self, limit: usize) -> Result<Vec<CatalogEntry>, StoreError>;

    /// Apply all writes atomically. Either every write lands or none does.
    async fn commit(&self, batch: &[CatalogWrite]) -> Result<usize, StoreError>;
}

/// Club records carrying the denormalized trending pool.
#[async_trait]
pub trait ClubStore: Send + Sync {
    async fn upsert_club(&self, club: &Club) -> Result<(), StoreError>;

    async fn get_club(&self, id: &str) -> Result<Club, StoreError>;

    async fn list_clubs(&self) -> Result<Vec<Club>, StoreError>;

    /// Overwrite one club's pool. Independent of every other club write.
    async fn set_trending_pool(
        &self,
        club_id: &str,
        pool: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Reject batches larger than the store allows.
pub fn check_batch_size(size: usize) -> Result<(), StoreError> {
    if size > MAX_BATCH_WRITES {
        return Err(StoreError::BatchTooLarge {
            size,
            max: MAX_BATCH_WRITES,
        });
    }
    Ok(())
}
