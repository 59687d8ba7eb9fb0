//! Daily job scheduler.
//!
//! One loop per enabled job. A loop sleeps until the job's next fire time,
//! runs it to completion and only then computes the following fire time, so
//! runs of the same job never overlap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use readtrend_core::{JobKind, JobTrigger, SchedulerConfig, TrendingJobs};

/// First instant strictly after `now` whose UTC time of day is `at`.
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        return today;
    }
    // `at` is a plain time of day and UTC has no gaps, so the next day always exists
    now.date_naive()
        .checked_add_days(Days::new(1))
        .map(|date| date.and_time(at).and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// One job's slot in the daily schedule.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledJob {
    pub job: JobKind,
    pub enabled: bool,
    pub at: String,
    /// `None` when the job is disabled or the scheduler is off.
    pub next_run: Option<DateTime<Utc>>,
}

/// The schedule as it would fire after `now`.
pub fn upcoming(config: &SchedulerConfig, now: DateTime<Utc>) -> Vec<ScheduledJob> {
    JobKind::ALL
        .iter()
        .map(|&kind| {
            let enabled = config.enabled && config.job(kind).enabled;
            ScheduledJob {
                job: kind,
                enabled,
                at: config.at(kind).to_string(),
                next_run: config
                    .time_of_day(kind)
                    .filter(|_| enabled)
                    .map(|at| next_run_after(now, at)),
            }
        })
        .collect()
}

/// Runs the trending jobs once a day each.
pub struct JobScheduler {
    config: SchedulerConfig,
    jobs: Arc<TrendingJobs>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl JobScheduler {
    pub fn new(config: SchedulerConfig, jobs: Arc<TrendingJobs>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            jobs,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawn one loop per enabled job.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return;
        }

        let mut tasks = self.tasks.lock().await;
        for kind in JobKind::ALL {
            if !self.config.job(kind).enabled {
                info!(job = %kind, "Scheduled job disabled");
                continue;
            }
            let Some(at) = self.config.time_of_day(kind) else {
                error!(job = %kind, at = self.config.at(kind), "Invalid fire time, job not scheduled");
                continue;
            };
            tasks.push(self.spawn_job_loop(kind, at));
        }

        info!(jobs = tasks.len(), "Scheduler started");
    }

    /// Signal every loop to stop and wait for them.
    ///
    /// A run in progress is dropped at its next await point; batches it has
    /// already committed stay committed.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Scheduler not running");
            return;
        }

        info!("Stopping scheduler");
        let _ = self.shutdown_tx.send(());

        let tasks: Vec<_> = self.tasks.lock().await.drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                error!("Scheduler task panicked: {}", e);
            }
        }

        info!("Scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    fn spawn_job_loop(&self, kind: JobKind, at: NaiveTime) -> JoinHandle<()> {
        let jobs = Arc::clone(&self.jobs);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!(job = %kind, at = %at.format("%H:%M"), "Job loop started");
            loop {
                let now = Utc::now();
                let next = next_run_after(now, at);
                let wait = (next - now).to_std().unwrap_or_default();
                debug!(job = %kind, next_run = %next, "Waiting for next run");

                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tokio::time::sleep(wait) => {}
                }

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        warn!(job = %kind, "Scheduled run interrupted by shutdown");
                        break;
                    }
                    // Failures are already logged, counted and audited by the runner
                    _ = jobs.run(kind, Utc::now(), JobTrigger::Scheduled) => {}
                }
            }
            info!(job = %kind, "Job loop stopped");
        })
    }
}
