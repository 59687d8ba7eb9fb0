//! SQLite-backed document store.
//!
//! One connection serves all three collections. Atomic batches map onto
//! SQLite transactions; a failed operation drops the transaction, which rolls
//! every staged write back.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{
    check_batch_size, CatalogEntry, CatalogStore, CatalogWrite, Club, ClubStore, EventStore,
    SearchEvent, StoreError,
};

/// SQLite-backed store for search events, catalog entries and clubs.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db)?;
        conn.busy_timeout(Duration::from_secs(5)).map_err(db)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            -- Append-only search log
            CREATE TABLE IF NOT EXISTS search_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                query TEXT NOT NULL,
                timestamp_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_search_events_timestamp ON search_events(timestamp_ms);

            -- Books; slug comparison is BINARY (case-sensitive)
            CREATE TABLE IF NOT EXISTS catalog_entries (
                slug TEXT PRIMARY KEY,
                title TEXT NOT NULL DEFAULT '',
                search_score_24h INTEGER NOT NULL DEFAULT 0,
                trending_score REAL NOT NULL DEFAULT 0,
                last_score_update TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_catalog_entries_trending ON catalog_entries(trending_score);
            CREATE INDEX IF NOT EXISTS idx_catalog_entries_search_score ON catalog_entries(search_score_24h);

            -- Clubs with their denormalized trending pool (JSON array of slugs)
            CREATE TABLE IF NOT EXISTS clubs (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                trending_pool TEXT NOT NULL DEFAULT '[]',
                last_trending_update TEXT
            );
            "#,
        )
        .map_err(db)?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection mutex poisoned".to_string()))
    }

    fn query_events(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<SearchEvent>, StoreError> {
        let mut stmt = conn.prepare(sql).map_err(db)?;
        let rows = stmt
            .query_map(params, |row| {
                let id: i64 = row.get(0)?;
                let query: String = row.get(1)?;
                let timestamp_ms: i64 = row.get(2)?;
                Ok((id, query, timestamp_ms))
            })
            .map_err(db)?;

        let mut events = Vec::new();
        for row in rows {
            let (id, query, timestamp_ms) = row.map_err(db)?;
            let timestamp = DateTime::from_timestamp_millis(timestamp_ms).ok_or_else(|| {
                StoreError::Database(format!("Invalid timestamp on event {}: {}", id, timestamp_ms))
            })?;
            events.push(SearchEvent {
                id,
                query,
                timestamp,
            });
        }
        Ok(events)
    }

    fn query_entries(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<CatalogEntry>, StoreError> {
        let mut stmt = conn.prepare(sql).map_err(db)?;
        let rows = stmt
            .query_map(params, Self::row_to_entry)
            .map_err(db)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(db)?);
        }
        Ok(entries)
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<CatalogEntry> {
        let search_score: i64 = row.get(2)?;
        let last_update: Option<String> = row.get(4)?;

        Ok(CatalogEntry {
            slug: row.get(0)?,
            title: row.get(1)?,
            search_score_24h: search_score.max(0) as u64,
            trending_score: row.get(3)?,
            last_score_update: last_update.as_deref().and_then(parse_timestamp),
        })
    }

    fn row_to_club(row: &rusqlite::Row) -> rusqlite::Result<(Club, String)> {
        let last_update: Option<String> = row.get(3)?;
        let pool_json: String = row.get(2)?;

        let club = Club {
            id: row.get(0)?,
            name: row.get(1)?,
            trending_pool: Vec::new(), // Decoded by the caller
            last_trending_update: last_update.as_deref().and_then(parse_timestamp),
        };
        Ok((club, pool_json))
    }

    fn decode_club((mut club, pool_json): (Club, String)) -> Result<Club, StoreError> {
        club.trending_pool = serde_json::from_str(&pool_json)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(club)
    }
}

const ENTRY_COLUMNS: &str = "slug, title, search_score_24h, trending_score, last_score_update";

fn db(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[async_trait]
impl EventStore for SqliteStore {
    async fn record(&self, query: &str, timestamp: DateTime<Utc>) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO search_events (query, timestamp_ms) VALUES (?, ?)",
            params![query, timestamp.timestamp_millis()],
        )
        .map_err(db)?;
        Ok(conn.last_insert_rowid())
    }

    async fn events_since(&self, threshold: DateTime<Utc>) -> Result<Vec<SearchEvent>, StoreError> {
        let conn = self.lock()?;
        Self::query_events(
            &conn,
            "SELECT id, query, timestamp_ms FROM search_events
             WHERE timestamp_ms >= ? ORDER BY timestamp_ms ASC, id ASC",
            &[&threshold.timestamp_millis()],
        )
    }

    async fn events_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SearchEvent>, StoreError> {
        let conn = self.lock()?;
        Self::query_events(
            &conn,
            "SELECT id, query, timestamp_ms FROM search_events
             WHERE timestamp_ms < ? ORDER BY timestamp_ms ASC, id ASC LIMIT ?",
            &[&cutoff.timestamp_millis(), &(limit as i64)],
        )
    }

    async fn delete_batch(&self, ids: &[i64]) -> Result<usize, StoreError> {
        check_batch_size(ids.len())?;

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db)?;
        let mut deleted = 0;
        {
            let mut stmt = tx
                .prepare("DELETE FROM search_events WHERE id = ?")
                .map_err(db)?;
            for id in ids {
                deleted += stmt.execute(params![id]).map_err(db)?;
            }
        }
        tx.commit().map_err(db)?;
        Ok(deleted)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM search_events", [], |row| row.get(0))
            .map_err(db)?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn upsert_entry(&self, entry: &CatalogEntry) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO catalog_entries (slug, title, search_score_24h, trending_score, last_score_update)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(slug) DO UPDATE SET
                title = excluded.title,
                search_score_24h = excluded.search_score_24h,
                trending_score = excluded.trending_score,
                last_score_update = excluded.last_score_update",
            params![
                &entry.slug,
                &entry.title,
                entry.search_score_24h as i64,
                entry.trending_score,
                entry.last_score_update.map(|t| t.to_rfc3339()),
            ],
        )
        .map_err(db)?;
        Ok(())
    }

    async fn get_entry(&self, slug: &str) -> Result<CatalogEntry, StoreError> {
        self.find_by_slug(slug)
            .await?
            .ok_or_else(|| StoreError::NotFound(slug.to_string()))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<CatalogEntry>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM catalog_entries WHERE slug = ? LIMIT 1",
            ENTRY_COLUMNS
        );
        let mut entries = Self::query_entries(&conn, &sql, &[&slug])?;
        Ok(entries.pop())
    }

    async fn entries_above(
        &self,
        min_score: f64,
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM catalog_entries WHERE trending_score > ?
             ORDER BY trending_score DESC, slug ASC LIMIT ?",
            ENTRY_COLUMNS
        );
        Self::query_entries(&conn, &sql, &[&min_score, &(limit as i64)])
    }

    async fn top_by_search_score(&self, limit: usize) -> Result<Vec<CatalogEntry>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM catalog_entries ORDER BY search_score_24h DESC, slug ASC LIMIT ?",
            ENTRY_COLUMNS
        );
        Self::query_entries(&conn, &sql, &[&(limit as i64)])
    }

    async fn commit(&self, batch: &[CatalogWrite]) -> Result<usize, StoreError> {
        check_batch_size(batch.len())?;

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db)?;
        for write in batch {
            let changed = match write {
                CatalogWrite::SetSearchScore {
                    slug,
                    count,
                    updated_at,
                } => tx
                    .execute(
                        "UPDATE catalog_entries SET search_score_24h = ?, last_score_update = ? WHERE slug = ?",
                        params![*count as i64, updated_at.to_rfc3339(), slug],
                    )
                    .map_err(db)?,
                CatalogWrite::SetTrendingScore { slug, score } => tx
                    .execute(
                        "UPDATE catalog_entries SET trending_score = ? WHERE slug = ?",
                        params![score, slug],
                    )
                    .map_err(db)?,
            };

            // Updating a missing document fails the whole batch
            if changed == 0 {
                return Err(StoreError::NotFound(write.slug().to_string()));
            }
        }
        tx.commit().map_err(db)?;
        Ok(batch.len())
    }
}

#[async_trait]
impl ClubStore for SqliteStore {
    async fn upsert_club(&self, club: &Club) -> Result<(), StoreError> {
        let pool_json = serde_json::to_string(&club.trending_pool)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO clubs (id, name, trending_pool, last_trending_update) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                trending_pool = excluded.trending_pool,
                last_trending_update = excluded.last_trending_update",
            params![
                &club.id,
                &club.name,
                pool_json,
                club.last_trending_update.map(|t| t.to_rfc3339()),
            ],
        )
        .map_err(db)?;
        Ok(())
    }

    async fn get_club(&self, id: &str) -> Result<Club, StoreError> {
        let conn = self.lock()?;
        let row = conn.query_row(
            "SELECT id, name, trending_pool, last_trending_update FROM clubs WHERE id = ?",
            params![id],
            Self::row_to_club,
        );

        match row {
            Ok(raw) => Self::decode_club(raw),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound(id.to_string())),
            Err(e) => Err(db(e)),
        }
    }

    async fn list_clubs(&self) -> Result<Vec<Club>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, name, trending_pool, last_trending_update FROM clubs ORDER BY id")
            .map_err(db)?;
        let rows = stmt.query_map([], Self::row_to_club).map_err(db)?;

        let mut clubs = Vec::new();
        for row in rows {
            clubs.push(Self::decode_club(row.map_err(db)?)?);
        }
        Ok(clubs)
    }

    async fn set_trending_pool(
        &self,
        club_id: &str,
        pool: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let pool_json =
            serde_json::to_string(pool).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE clubs SET trending_pool = ?, last_trending_update = ? WHERE id = ?",
                params![pool_json, updated_at.to_rfc3339(), club_id],
            )
            .map_err(db)?;

        if changed == 0 {
            return Err(StoreError::NotFound(club_id.to_string()));
        }
        Ok(())
    }
}
