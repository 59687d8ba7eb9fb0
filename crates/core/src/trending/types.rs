//! Job kinds, run reports and errors.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// The four scheduled jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Aggregation,
    Decay,
    Retention,
    Pool,
}

impl JobKind {
    pub const ALL: [JobKind; 4] = [
        JobKind::Aggregation,
        JobKind::Decay,
        JobKind::Retention,
        JobKind::Pool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregation => "aggregation",
            Self::Decay => "decay",
            Self::Retention => "retention",
            Self::Pool => "pool",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aggregation" => Ok(Self::Aggregation),
            "decay" => Ok(Self::Decay),
            "retention" => Ok(Self::Retention),
            "pool" => Ok(Self::Pool),
            other => Err(JobError::UnknownJob(other.to_string())),
        }
    }
}

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobTrigger {
    Scheduled,
    Manual,
}

impl JobTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        }
    }
}

/// A normalized term and how often it was searched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: u64,
}

/// Outcome of one aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationReport {
    pub window_start: DateTime<Utc>,
    /// Events read from the window.
    pub events_scanned: usize,
    /// Distinct non-empty normalized terms seen.
    pub terms_aggregated: usize,
    /// The terms that were mapped onto the catalog, highest first.
    pub top_terms: Vec<TermCount>,
    /// Catalog entries whose `search_score_24h` was written.
    pub entries_updated: usize,
}

/// Outcome of one decay run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayReport {
    /// Entries above the threshold that were fetched (at most the batch size).
    pub entries_selected: usize,
    pub entries_decayed: usize,
    /// The selection hit the batch cap, so more entries may qualify.
    pub truncated: bool,
}

/// Outcome of one retention run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionReport {
    pub cutoff: DateTime<Utc>,
    /// Non-empty delete batches committed.
    pub batches: usize,
    pub total_deleted: usize,
}

/// Outcome of one pool publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolReport {
    pub pool: Vec<String>,
    pub clubs_total: usize,
    pub clubs_updated: usize,
    pub clubs_failed: usize,
}

/// Report of any job, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum JobReport {
    Aggregation(AggregationReport),
    Decay(DecayReport),
    Retention(RetentionReport),
    Pool(PoolReport),
}

impl JobReport {
    pub fn kind(&self) -> JobKind {
        match self {
            Self::Aggregation(_) => JobKind::Aggregation,
            Self::Decay(_) => JobKind::Decay,
            Self::Retention(_) => JobKind::Retention,
            Self::Pool(_) => JobKind::Pool,
        }
    }
}

/// Errors surfaced by trending jobs.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{job} job timed out after {secs}s")]
    TimedOut { job: JobKind, secs: u64 },

    #[error("unknown job: {0}")]
    UnknownJob(String),

    #[error("{job} window of {span} reaches outside the supported date range")]
    WindowOutOfRange { job: JobKind, span: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_kind_roundtrip() {
        for kind in JobKind::ALL {
            assert_eq!(kind.as_str().parse::<JobKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_job_kind() {
        let err = "vote".parse::<JobKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown job: vote");
    }

    #[test]
    fn test_report_serialization_is_tagged() {
        let report = JobReport::Decay(DecayReport {
            entries_selected: 3,
            entries_decayed: 3,
            truncated: false,
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["job"], "decay");
        assert_eq!(json["entries_decayed"], 3);
        assert_eq!(report.kind(), JobKind::Decay);
    }

    #[test]
    fn test_error_display() {
        let err = JobError::TimedOut {
            job: JobKind::Retention,
            secs: 540,
        };
        assert_eq!(err.to_string(), "retention job timed out after 540s");

        let err = JobError::from(StoreError::NotFound("dune".to_string()));
        assert_eq!(err.to_string(), "store error: Not found: dune");
    }
}
