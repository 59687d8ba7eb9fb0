//! Testing utilities: fixtures and a failure-injecting store.
//!
//! # Example
//!
//! ```rust,ignore
//! use readtrend_core::testing::{fixtures, FlakyStore};
//!
//! let store = Arc::new(FlakyStore::in_memory());
//! fixtures::seed_events(store.as_ref(), "dune", 3, Utc::now()).await;
//! store.fail_club("club-2").await;
//! ```

mod flaky_store;

pub use flaky_store::FlakyStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Utc};

    use crate::store::{CatalogEntry, CatalogStore, Club, ClubStore, EventStore};

    /// A catalog entry whose title is derived from the slug.
    pub fn catalog_entry(slug: &str) -> CatalogEntry {
        CatalogEntry::new(slug, title_case(slug))
    }

    /// A club named after its id.
    pub fn club(id: &str) -> Club {
        Club::new(id, format!("Club {}", id))
    }

    /// Record `count` identical searches at `at`.
    pub async fn seed_events(store: &dyn EventStore, query: &str, count: usize, at: DateTime<Utc>) {
        for _ in 0..count {
            store
                .record(query, at)
                .await
                .expect("failed to seed search event");
        }
    }

    /// Insert catalog entries with the given trending scores.
    pub async fn seed_trending(store: &dyn CatalogStore, scores: &[(&str, f64)]) {
        for (slug, score) in scores {
            store
                .upsert_entry(&catalog_entry(slug).with_trending_score(*score))
                .await
                .expect("failed to seed catalog entry");
        }
    }

    /// Insert catalog entries with the given search scores.
    pub async fn seed_search_scores(store: &dyn CatalogStore, scores: &[(&str, u64)]) {
        for (slug, score) in scores {
            store
                .upsert_entry(&catalog_entry(slug).with_search_score(*score))
                .await
                .expect("failed to seed catalog entry");
        }
    }

    /// Insert one empty club per id.
    pub async fn seed_clubs(store: &dyn ClubStore, ids: &[&str]) {
        for id in ids {
            store
                .upsert_club(&club(id))
                .await
                .expect("failed to seed club");
        }
    }

    fn title_case(slug: &str) -> String {
        slug.split('-')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_catalog_entry_title() {
            let entry = catalog_entry("the-hobbit");
            assert_eq!(entry.slug, "the-hobbit");
            assert_eq!(entry.title, "The Hobbit");
        }
    }
}
