use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events recorded in the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },
    JobStarted {
        job: String,
        trigger: String,
    },
    JobCompleted {
        job: String,
        trigger: String,
        duration_ms: u64,
        /// The job's report, as JSON.
        report: serde_json::Value,
    },
    JobFailed {
        job: String,
        trigger: String,
        duration_ms: u64,
        error: String,
    },
}

impl AuditEvent {
    /// Get the event type as a string (for database storage)
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::JobStarted { .. } => "job_started",
            Self::JobCompleted { .. } => "job_completed",
            Self::JobFailed { .. } => "job_failed",
        }
    }

    /// Extract the job name if this event belongs to a job run
    pub fn job(&self) -> Option<&str> {
        match self {
            Self::JobStarted { job, .. }
            | Self::JobCompleted { job, .. }
            | Self::JobFailed { job, .. } => Some(job),
            Self::ServiceStarted { .. } | Self::ServiceStopped { .. } => None,
        }
    }
}

/// A stored audit record with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub job: Option<String>,
    pub data: AuditEvent,
}
