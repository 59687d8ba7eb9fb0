//! Trending pipeline configuration.
//!
//! Each job receives its own section at construction time. Defaults match the
//! values the pipeline has always run with in production.

use serde::{Deserialize, Serialize};

/// All trending job settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendingConfig {
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub decay: DecayConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

/// Aggregator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Lookback window in hours.
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,

    /// Number of distinct terms mapped onto the catalog per run.
    #[serde(default = "default_top_terms")]
    pub top_terms: usize,
}

fn default_window_hours() -> u32 {
    24
}

fn default_top_terms() -> usize {
    50
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
            top_terms: default_top_terms(),
        }
    }
}

/// Decay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayConfig {
    /// Multiplier applied once per run (0.9 = 10% daily decay).
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,

    /// Entries at or below this score are no longer selected.
    #[serde(default = "default_min_threshold")]
    pub min_threshold: f64,

    /// Maximum entries decayed per run. Anything beyond is skipped until next run.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_decay_rate() -> f64 {
    0.9
}

fn default_min_threshold() -> f64 {
    0.5
}

fn default_batch_size() -> usize {
    300
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            decay_rate: default_decay_rate(),
            min_threshold: default_min_threshold(),
            batch_size: default_batch_size(),
        }
    }
}

/// Retention settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Events older than this many days are deleted.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Events deleted per iteration.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between iterations (milliseconds).
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

fn default_retention_days() -> u32 {
    7
}

fn default_pause_ms() -> u64 {
    50
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            batch_size: default_batch_size(),
            pause_ms: default_pause_ms(),
        }
    }
}

/// Pool publisher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of slugs published to each club.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    10
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
        }
    }
}
