//! Store wrapper with injectable failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::store::{
    CatalogEntry, CatalogStore, CatalogWrite, Club, ClubStore, EventStore, SearchEvent,
    SqliteStore, StoreError,
};

/// Wraps a [`SqliteStore`] and fails selected operations on demand.
///
/// Everything not configured to fail is delegated unchanged.
///
/// # Example
///
/// ```rust,ignore
/// use readtrend_core::testing::FlakyStore;
///
/// let store = Arc::new(FlakyStore::in_memory());
/// store.fail_club("club-3").await;
/// store.fail_commits(true).await;
/// ```
pub struct FlakyStore {
    inner: Arc<SqliteStore>,
    failing_clubs: RwLock<HashSet<String>>,
    fail_commits: RwLock<bool>,
    fail_event_reads: RwLock<bool>,
    /// Number of delete batches allowed before deletes start failing.
    deletes_allowed: RwLock<Option<usize>>,
}

impl FlakyStore {
    pub fn new(inner: Arc<SqliteStore>) -> Self {
        Self {
            inner,
            failing_clubs: RwLock::new(HashSet::new()),
            fail_commits: RwLock::new(false),
            fail_event_reads: RwLock::new(false),
            deletes_allowed: RwLock::new(None),
        }
    }

    /// Fresh in-memory store. Panics if SQLite cannot open, which only happens in broken test setups.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(
            SqliteStore::in_memory().expect("in-memory sqlite store"),
        ))
    }

    /// The wrapped store, for assertions that bypass injected failures.
    pub fn inner(&self) -> &Arc<SqliteStore> {
        &self.inner
    }

    /// Make pool writes to this club fail.
    pub async fn fail_club(&self, club_id: &str) {
        self.failing_clubs.write().await.insert(club_id.to_string());
    }

    /// Make every catalog batch commit fail.
    pub async fn fail_commits(&self, fail: bool) {
        *self.fail_commits.write().await = fail;
    }

    /// Make reads of search events fail.
    pub async fn fail_event_reads(&self, fail: bool) {
        *self.fail_event_reads.write().await = fail;
    }

    /// Let `n` more delete batches through, then fail every following one.
    pub async fn fail_deletes_after(&self, n: usize) {
        *self.deletes_allowed.write().await = Some(n);
    }

    fn injected(what: &str) -> StoreError {
        StoreError::Database(format!("injected failure: {}", what))
    }
}

#[async_trait]
impl EventStore for FlakyStore {
    async fn record(&self, query: &str, timestamp: DateTime<Utc>) -> Result<i64, StoreError> {
        self.inner.record(query, timestamp).await
    }

    async fn events_since(&self, threshold: DateTime<Utc>) -> Result<Vec<SearchEvent>, StoreError> {
        if *self.fail_event_reads.read().await {
            return Err(Self::injected("events_since"));
        }
        self.inner.events_since(threshold).await
    }

    async fn events_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SearchEvent>, StoreError> {
        if *self.fail_event_reads.read().await {
            return Err(Self::injected("events_before"));
        }
        self.inner.events_before(cutoff, limit).await
    }

    async fn delete_batch(&self, ids: &[i64]) -> Result<usize, StoreError> {
        {
            let mut allowed = self.deletes_allowed.write().await;
            if let Some(remaining) = allowed.as_mut() {
                if *remaining == 0 {
                    return Err(Self::injected("delete_batch"));
                }
                *remaining -= 1;
            }
        }
        self.inner.delete_batch(ids).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        EventStore::count(self.inner.as_ref()).await
    }
}

#[async_trait]
impl CatalogStore for FlakyStore {
    async fn upsert_entry(&self, entry: &CatalogEntry) -> Result<(), StoreError> {
        self.inner.upsert_entry(entry).await
    }

    async fn get_entry(&self, slug: &str) -> Result<CatalogEntry, StoreError> {
        self.inner.get_entry(slug).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<CatalogEntry>, StoreError> {
        self.inner.find_by_slug(slug).await
    }

    async fn entries_above(
        &self,
        min_score: f64,
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, StoreError> {
        self.inner.entries_above(min_score, limit).await
    }

    async fn top_by_search_score(&self, limit: usize) -> Result<Vec<CatalogEntry>, StoreError> {
        self.inner.top_by_search_score(limit).await
    }

    async fn commit(&self, batch: &[CatalogWrite]) -> Result<usize, StoreError> {
        if *self.fail_commits.read().await {
            return Err(Self::injected("commit"));
        }
        self.inner.commit(batch).await
    }
}

#[async_trait]
impl ClubStore for FlakyStore {
    async fn upsert_club(&self, club: &Club) -> Result<(), StoreError> {
        self.inner.upsert_club(club).await
    }

    async fn get_club(&self, id: &str) -> Result<Club, StoreError> {
        self.inner.get_club(id).await
    }

    async fn list_clubs(&self) -> Result<Vec<Club>, StoreError> {
        self.inner.list_clubs().await
    }

    async fn set_trending_pool(
        &self,
        club_id: &str,
        pool: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.failing_clubs.read().await.contains(club_id) {
            return Err(Self::injected("set_trending_pool"));
        }
        self.inner.set_trending_pool(club_id, pool, updated_at).await
    }
}
