//! Multiplicative decay of stored trending scores.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::store::{CatalogStore, CatalogWrite};

use super::config::DecayConfig;
use super::types::{DecayReport, JobError};

/// Apply one decay step. Never returns a negative score.
pub fn decay_score(current: f64, rate: f64) -> f64 {
    (current * rate).max(0.0)
}

/// The decay job.
pub struct DecayJob {
    config: DecayConfig,
    catalog: Arc<dyn CatalogStore>,
}

impl DecayJob {
    pub fn new(config: DecayConfig, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { config, catalog }
    }

    pub fn config(&self) -> &DecayConfig {
        &self.config
    }

    /// Decay every selected entry once.
    ///
    /// Selection is capped at `batch_size`; entries past the cap wait for a
    /// later run. Entries at or below `min_threshold` are never selected, so
    /// their score stays where it landed.
    pub async fn run(&self, _now: DateTime<Utc>) -> Result<DecayReport, JobError> {
        let entries = self
            .catalog
            .entries_above(self.config.min_threshold, self.config.batch_size)
            .await?;

        let batch: Vec<CatalogWrite> = entries
            .iter()
            .map(|entry| CatalogWrite::SetTrendingScore {
                slug: entry.slug.clone(),
                score: decay_score(entry.trending_score, self.config.decay_rate),
            })
            .collect();

        let entries_decayed = self.catalog.commit(&batch).await?;
        let truncated = entries.len() >= self.config.batch_size;

        info!(
            entries_selected = entries.len(),
            entries_decayed,
            truncated,
            decay_rate = self.config.decay_rate,
            "Decayed trending scores"
        );

        Ok(DecayReport {
            entries_selected: entries.len(),
            entries_decayed,
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CatalogEntry, SqliteStore};

    #[test]
    fn test_decay_score() {
        assert!((decay_score(10.0, 0.9) - 9.0).abs() < 1e-9);
        assert!((decay_score(1.0, 0.5) - 0.5).abs() < 1e-9);
        assert_eq!(decay_score(0.0, 0.9), 0.0);
    }

    #[test]
    fn test_decay_score_never_negative() {
        assert_eq!(decay_score(-4.0, 0.9), 0.0);
    }

    #[tokio::test]
    async fn test_run_skips_entries_at_threshold() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store
            .upsert_entry(&CatalogEntry::new("at", "At").with_trending_score(0.5))
            .await
            .unwrap();
        store
            .upsert_entry(&CatalogEntry::new("above", "Above").with_trending_score(0.6))
            .await
            .unwrap();

        let job = DecayJob::new(DecayConfig::default(), Arc::clone(&store) as Arc<dyn CatalogStore>);
        let report = job.run(Utc::now()).await.unwrap();

        assert_eq!(report.entries_selected, 1);
        assert!(!report.truncated);
        assert_eq!(store.get_entry("at").await.unwrap().trending_score, 0.5);
        assert!((store.get_entry("above").await.unwrap().trending_score - 0.54).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_run_with_empty_catalog() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let job = DecayJob::new(DecayConfig::default(), store);

        let report = job.run(Utc::now()).await.unwrap();
        assert_eq!(report.entries_selected, 0);
        assert_eq!(report.entries_decayed, 0);
    }
}
