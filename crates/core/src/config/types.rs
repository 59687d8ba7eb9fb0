use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::trending::{JobKind, TrendingConfig};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub trending: TrendingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("readtrend.db")
}

/// Daily scheduler configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Upper bound on a single job run.
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
    #[serde(default)]
    pub aggregation: ScheduleConfig,
    #[serde(default)]
    pub decay: ScheduleConfig,
    #[serde(default)]
    pub retention: ScheduleConfig,
    #[serde(default)]
    pub pool: ScheduleConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            job_timeout_secs: default_job_timeout_secs(),
            aggregation: ScheduleConfig::default(),
            decay: ScheduleConfig::default(),
            retention: ScheduleConfig::default(),
            pool: ScheduleConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_job_timeout_secs() -> u64 {
    540
}

/// When a single job fires.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Daily fire time, `HH:MM` in UTC. Falls back to the job's default slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<String>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            at: None,
        }
    }
}

/// Default daily slot for each job. The jobs run an hour apart in pipeline order.
pub fn default_fire_time(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Aggregation => "03:00",
        JobKind::Decay => "04:00",
        JobKind::Retention => "05:00",
        JobKind::Pool => "06:00",
    }
}

/// Parse an `HH:MM` time of day.
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

impl SchedulerConfig {
    pub fn job(&self, kind: JobKind) -> &ScheduleConfig {
        match kind {
            JobKind::Aggregation => &self.aggregation,
            JobKind::Decay => &self.decay,
            JobKind::Retention => &self.retention,
            JobKind::Pool => &self.pool,
        }
    }

    /// The configured `HH:MM` for a job, or its default slot.
    pub fn at(&self, kind: JobKind) -> &str {
        self.job(kind)
            .at
            .as_deref()
            .unwrap_or_else(|| default_fire_time(kind))
    }

    /// Parsed fire time. `None` only if the configured value is malformed,
    /// which `validate_config` rejects.
    pub fn time_of_day(&self, kind: JobKind) -> Option<NaiveTime> {
        parse_time_of_day(self.at(kind))
    }
}

/// Config as served by the API. The database location is reduced to its file name.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: SanitizedDatabaseConfig,
    pub trending: TrendingConfig,
    pub scheduler: SanitizedSchedulerConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDatabaseConfig {
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSchedulerConfig {
    pub enabled: bool,
    pub job_timeout_secs: u64,
    pub jobs: Vec<SanitizedSchedule>,
}

/// A job's effective schedule, defaults resolved.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSchedule {
    pub job: JobKind,
    pub enabled: bool,
    pub at: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: SanitizedDatabaseConfig {
                file_name: config
                    .database
                    .path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned()),
            },
            trending: config.trending.clone(),
            scheduler: SanitizedSchedulerConfig {
                enabled: config.scheduler.enabled,
                job_timeout_secs: config.scheduler.job_timeout_secs,
                jobs: JobKind::ALL
                    .iter()
                    .map(|&kind| SanitizedSchedule {
                        job: kind,
                        enabled: config.scheduler.job(kind).enabled,
                        at: config.scheduler.at(kind).to_string(),
                    })
                    .collect(),
            },
        }
    }
}
