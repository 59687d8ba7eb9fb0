//! Trending jobs.
//!
//! Four batch jobs keep the catalog's trending signals fresh:
//!
//! - [`Aggregator`] tallies recent search events onto catalog entries.
//! - [`DecayJob`] shrinks stored trending scores.
//! - [`RetentionJob`] deletes search events past the retention window.
//! - [`PoolPublisher`] copies the top slugs onto every club.
//!
//! [`TrendingJobs`] runs any of them with uniform logging, metrics and audit.

mod aggregator;
mod config;
mod decay;
mod pool;
mod retention;
mod runner;
mod types;

pub use aggregator::{normalize_query, rank_terms, Aggregator};
pub use config::{AggregatorConfig, DecayConfig, PoolConfig, RetentionConfig, TrendingConfig};
pub use decay::{decay_score, DecayJob};
pub use pool::PoolPublisher;
pub use retention::RetentionJob;
pub use runner::TrendingJobs;
pub use types::{
    AggregationReport, DecayReport, JobError, JobKind, JobReport, JobTrigger, PoolReport,
    RetentionReport, TermCount,
};
