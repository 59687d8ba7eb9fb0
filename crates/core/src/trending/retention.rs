//! Paginated deletion of expired search events.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::store::EventStore;

use super::config::RetentionConfig;
use super::types::{JobError, JobKind, RetentionReport};

/// The retention job.
pub struct RetentionJob {
    config: RetentionConfig,
    events: Arc<dyn EventStore>,
}

impl RetentionJob {
    pub fn new(config: RetentionConfig, events: Arc<dyn EventStore>) -> Self {
        Self { config, events }
    }

    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }

    /// Delete events older than the retention window, oldest first.
    ///
    /// Each batch commits on its own. If a batch fails the error is returned
    /// and everything committed before it stays deleted; the next run picks up
    /// from the oldest remaining event.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RetentionReport, JobError> {
        let cutoff = now
            .checked_sub_signed(Duration::days(i64::from(self.config.retention_days)))
            .ok_or_else(|| JobError::WindowOutOfRange {
                job: JobKind::Retention,
                span: format!("{}d", self.config.retention_days),
            })?;
        let pause = StdDuration::from_millis(self.config.pause_ms);

        let mut batches = 0;
        let mut total_deleted = 0;

        loop {
            let expired = self
                .events
                .events_before(cutoff, self.config.batch_size)
                .await?;
            if expired.is_empty() {
                break;
            }

            let ids: Vec<i64> = expired.iter().map(|e| e.id).collect();
            total_deleted += self.events.delete_batch(&ids).await?;
            batches += 1;
            debug!(batch = batches, total_deleted, "Deleted expired search events");

            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        info!(
            cutoff = %cutoff,
            batches,
            total_deleted,
            "Search event retention complete"
        );

        Ok(RetentionReport {
            cutoff,
            batches,
            total_deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn config(batch_size: usize) -> RetentionConfig {
        RetentionConfig {
            batch_size,
            pause_ms: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_keeps_recent_events() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let now = Utc::now();
        store.record("old", now - Duration::days(8)).await.unwrap();
        store.record("recent", now - Duration::days(6)).await.unwrap();

        let job = RetentionJob::new(config(300), Arc::clone(&store) as Arc<dyn EventStore>);
        let report = job.run(now).await.unwrap();

        assert_eq!(report.total_deleted, 1);
        assert_eq!(report.batches, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_drains_in_ceil_batches() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let now = Utc::now();
        for i in 0..25 {
            store
                .record(&format!("q{}", i), now - Duration::days(30) + Duration::minutes(i))
                .await
                .unwrap();
        }

        let job = RetentionJob::new(config(10), Arc::clone(&store) as Arc<dyn EventStore>);
        let report = job.run(now).await.unwrap();

        assert_eq!(report.batches, 3);
        assert_eq!(report.total_deleted, 25);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cutoff_past_date_range_fails() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store.record("dune", Utc::now()).await.unwrap();
        let job = RetentionJob::new(
            RetentionConfig {
                retention_days: u32::MAX,
                ..config(10)
            },
            Arc::clone(&store) as Arc<dyn EventStore>,
        );

        let err = job.run(Utc::now()).await.unwrap_err();
        assert!(matches!(
            err,
            JobError::WindowOutOfRange {
                job: JobKind::Retention,
                ..
            }
        ));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_store_terminates() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let job = RetentionJob::new(config(10), store);

        let report = job.run(Utc::now()).await.unwrap();
        assert_eq!(report.batches, 0);
        assert_eq!(report.total_deleted, 0);
    }
}
