//! Uniform execution of trending jobs.
//!
//! Every run, whether scheduled or manual, goes through [`TrendingJobs::run`]
//! so that logging, metrics and the audit trail look the same for all jobs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::audit::{AuditEvent, AuditHandle};
use crate::metrics;
use crate::store::{CatalogStore, ClubStore, EventStore};

use super::aggregator::Aggregator;
use super::config::TrendingConfig;
use super::decay::DecayJob;
use super::pool::PoolPublisher;
use super::retention::RetentionJob;
use super::types::{JobError, JobKind, JobReport, JobTrigger};

/// The four trending jobs wired to their stores.
pub struct TrendingJobs {
    aggregator: Aggregator,
    decay: DecayJob,
    retention: RetentionJob,
    pool: PoolPublisher,
    timeout: Option<Duration>,
    audit: Option<AuditHandle>,
}

impl TrendingJobs {
    pub fn new(
        config: TrendingConfig,
        events: Arc<dyn EventStore>,
        catalog: Arc<dyn CatalogStore>,
        clubs: Arc<dyn ClubStore>,
    ) -> Self {
        Self {
            aggregator: Aggregator::new(config.aggregator, Arc::clone(&events), Arc::clone(&catalog)),
            decay: DecayJob::new(config.decay, Arc::clone(&catalog)),
            retention: RetentionJob::new(config.retention, events),
            pool: PoolPublisher::new(config.pool, catalog, clubs),
            timeout: None,
            audit: None,
        }
    }

    /// Abort any run that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Run one job against `now`.
    ///
    /// Failures are logged, counted and audited before being returned.
    /// A run that exceeds the timeout is dropped at its next await point and
    /// reported as [`JobError::TimedOut`]; batches it already committed stay.
    pub async fn run(
        &self,
        kind: JobKind,
        now: DateTime<Utc>,
        trigger: JobTrigger,
    ) -> Result<JobReport, JobError> {
        info!(job = %kind, trigger = trigger.as_str(), "Starting trending job");
        self.emit(AuditEvent::JobStarted {
            job: kind.to_string(),
            trigger: trigger.as_str().to_string(),
        })
        .await;

        let start = Instant::now();
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.execute(kind, now)).await {
                Ok(result) => result,
                Err(_) => Err(JobError::TimedOut {
                    job: kind,
                    secs: limit.as_secs(),
                }),
            },
            None => self.execute(kind, now).await,
        };
        let elapsed = start.elapsed();
        let duration_ms = elapsed.as_millis() as u64;

        metrics::JOB_DURATION
            .with_label_values(&[kind.as_str()])
            .observe(elapsed.as_secs_f64());

        match &result {
            Ok(report) => {
                metrics::JOB_RUNS
                    .with_label_values(&[kind.as_str(), "success"])
                    .inc();
                record_report_metrics(report);
                info!(job = %kind, duration_ms, "Trending job completed");

                let report = serde_json::to_value(report).unwrap_or(serde_json::Value::Null);
                self.emit(AuditEvent::JobCompleted {
                    job: kind.to_string(),
                    trigger: trigger.as_str().to_string(),
                    duration_ms,
                    report,
                })
                .await;
            }
            Err(e) => {
                metrics::JOB_RUNS
                    .with_label_values(&[kind.as_str(), "failed"])
                    .inc();
                error!(job = %kind, duration_ms, error = %e, "Trending job failed");

                self.emit(AuditEvent::JobFailed {
                    job: kind.to_string(),
                    trigger: trigger.as_str().to_string(),
                    duration_ms,
                    error: e.to_string(),
                })
                .await;
            }
        }

        result
    }

    async fn execute(&self, kind: JobKind, now: DateTime<Utc>) -> Result<JobReport, JobError> {
        Ok(match kind {
            JobKind::Aggregation => JobReport::Aggregation(self.aggregator.run(now).await?),
            JobKind::Decay => JobReport::Decay(self.decay.run(now).await?),
            JobKind::Retention => JobReport::Retention(self.retention.run(now).await?),
            JobKind::Pool => JobReport::Pool(self.pool.run(now).await?),
        })
    }

    async fn emit(&self, event: AuditEvent) {
        if let Some(ref audit) = self.audit {
            audit.emit(event).await;
        }
    }
}

fn record_report_metrics(report: &JobReport) {
    match report {
        JobReport::Aggregation(r) => {
            metrics::EVENTS_SCANNED.inc_by(r.events_scanned as u64);
            metrics::ENTRIES_UPDATED
                .with_label_values(&["aggregation"])
                .inc_by(r.entries_updated as u64);
        }
        JobReport::Decay(r) => {
            metrics::ENTRIES_UPDATED
                .with_label_values(&["decay"])
                .inc_by(r.entries_decayed as u64);
        }
        JobReport::Retention(r) => {
            metrics::EVENTS_DELETED.inc_by(r.total_deleted as u64);
        }
        JobReport::Pool(r) => {
            metrics::CLUB_WRITES
                .with_label_values(&["success"])
                .inc_by(r.clubs_updated as u64);
            metrics::CLUB_WRITES
                .with_label_values(&["failed"])
                .inc_by(r.clubs_failed as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{create_audit_system, AuditFilter, AuditStore, SqliteAuditStore};
    use crate::store::{CatalogEntry, SqliteStore};

    fn jobs(store: &Arc<SqliteStore>) -> TrendingJobs {
        TrendingJobs::new(
            TrendingConfig::default(),
            Arc::clone(store) as Arc<dyn EventStore>,
            Arc::clone(store) as Arc<dyn CatalogStore>,
            Arc::clone(store) as Arc<dyn ClubStore>,
        )
    }

    #[tokio::test]
    async fn test_run_dispatches_by_kind() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let jobs = jobs(&store);

        for kind in JobKind::ALL {
            let report = jobs.run(kind, Utc::now(), JobTrigger::Manual).await.unwrap();
            assert_eq!(report.kind(), kind);
        }
    }

    #[tokio::test]
    async fn test_run_audits_start_and_completion() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store
            .upsert_entry(&CatalogEntry::new("dune", "Dune").with_trending_score(10.0))
            .await
            .unwrap();

        let audit_store = Arc::new(SqliteAuditStore::in_memory().unwrap());
        let (handle, writer) =
            create_audit_system(Arc::clone(&audit_store) as Arc<dyn AuditStore>, 16);
        let writer_task = tokio::spawn(writer.run());

        let jobs = jobs(&store).with_audit(handle);
        jobs.run(JobKind::Decay, Utc::now(), JobTrigger::Scheduled)
            .await
            .unwrap();
        drop(jobs);
        writer_task.await.unwrap();

        let records = audit_store
            .query(&AuditFilter::new().with_job("decay"))
            .unwrap();
        let types: Vec<_> = records.iter().map(|r| r.event_type.as_str()).collect();
        assert_eq!(types, vec!["job_completed", "job_started"]);

        match &records[0].data {
            AuditEvent::JobCompleted {
                trigger, report, ..
            } => {
                assert_eq!(trigger, "scheduled");
                assert_eq!(report["entries_decayed"], 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_exceeding_timeout_reports_timed_out() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        for i in 0..5 {
            store
                .record(&format!("q{}", i), Utc::now() - chrono::Duration::days(30))
                .await
                .unwrap();
        }

        let mut config = TrendingConfig::default();
        config.retention.batch_size = 1;
        config.retention.pause_ms = 1_000;
        let jobs = TrendingJobs::new(
            config,
            Arc::clone(&store) as Arc<dyn EventStore>,
            Arc::clone(&store) as Arc<dyn CatalogStore>,
            Arc::clone(&store) as Arc<dyn ClubStore>,
        )
        .with_timeout(Duration::from_millis(50));

        let err = jobs
            .run(JobKind::Retention, Utc::now(), JobTrigger::Manual)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            JobError::TimedOut {
                job: JobKind::Retention,
                ..
            }
        ));
        // The first batch committed before the pause
        assert_eq!(store.count().await.unwrap(), 4);
    }
}
