//! Document types shared by the event, catalog and club stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the number of operations in one atomic batch.
pub const MAX_BATCH_WRITES: usize = 500;

/// A single recorded search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEvent {
    /// Store-assigned id.
    pub id: i64,
    /// Free-text query exactly as the user typed it.
    pub query: String,
    /// When the search happened.
    pub timestamp: DateTime<Utc>,
}

/// A book in the catalog, reduced to the fields the trending pipeline touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Identity of the book (lowercase for aggregation hits).
    pub slug: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Raw query count from the last aggregation that matched this slug.
    #[serde(default)]
    pub search_score_24h: u64,
    /// Independently decaying popularity value.
    #[serde(default)]
    pub trending_score: f64,
    /// When `search_score_24h` was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_score_update: Option<DateTime<Utc>>,
}

impl CatalogEntry {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            search_score_24h: 0,
            trending_score: 0.0,
            last_score_update: None,
        }
    }

    pub fn with_trending_score(mut self, score: f64) -> Self {
        self.trending_score = score;
        self
    }

    pub fn with_search_score(mut self, score: u64) -> Self {
        self.search_score_24h = score;
        self
    }
}

/// A club record carrying the denormalized trending pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Slugs published by the last pool run.
    #[serde(default)]
    pub trending_pool: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_trending_update: Option<DateTime<Utc>>,
}

impl Club {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            trending_pool: Vec::new(),
            last_trending_update: None,
        }
    }
}

/// One staged write inside an atomic catalog batch.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogWrite {
    /// Overwrite the raw aggregation count.
    SetSearchScore {
        slug: String,
        count: u64,
        updated_at: DateTime<Utc>,
    },
    /// Overwrite the decayed popularity value.
    SetTrendingScore { slug: String, score: f64 },
}

impl CatalogWrite {
    pub fn slug(&self) -> &str {
        match self {
            Self::SetSearchScore { slug, .. } | Self::SetTrendingScore { slug, .. } => slug,
        }
    }
}

/// Errors for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Batch of {size} operations exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_entry_defaults_from_json() {
        let json = r#"{"slug": "dune"}"#;
        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.slug, "dune");
        assert_eq!(entry.title, "");
        assert_eq!(entry.search_score_24h, 0);
        assert_eq!(entry.trending_score, 0.0);
        assert!(entry.last_score_update.is_none());
    }

    #[test]
    fn test_catalog_entry_skips_missing_update_time() {
        let entry = CatalogEntry::new("dune", "Dune").with_trending_score(3.5);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("last_score_update"));
        assert!(json.contains("\"trending_score\":3.5"));
    }

    #[test]
    fn test_catalog_write_slug() {
        let write = CatalogWrite::SetTrendingScore {
            slug: "emma".to_string(),
            score: 1.0,
        };
        assert_eq!(write.slug(), "emma");
    }

    #[test]
    fn test_batch_too_large_display() {
        let err = StoreError::BatchTooLarge { size: 501, max: 500 };
        assert_eq!(
            err.to_string(),
            "Batch of 501 operations exceeds the limit of 500"
        );
    }
}
