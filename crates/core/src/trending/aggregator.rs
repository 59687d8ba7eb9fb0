//! Search-term aggregation.
//!
//! Tallies the trailing window of search events into normalized terms, keeps
//! the most searched ones and writes their counts onto catalog entries whose
//! slug is exactly the term.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::store::{CatalogStore, CatalogWrite, EventStore, SearchEvent};

use super::config::AggregatorConfig;
use super::types::{AggregationReport, JobError, JobKind, TermCount};

/// Lowercase and trim a raw query. Returns `None` for blank queries.
pub fn normalize_query(query: &str) -> Option<String> {
    let term = query.trim().to_lowercase();
    if term.is_empty() {
        None
    } else {
        Some(term)
    }
}

/// Count normalized terms, most searched first.
///
/// Ties keep the order in which terms were first seen, so the ranking is
/// deterministic for a given event sequence.
pub fn rank_terms(events: &[SearchEvent]) -> Vec<TermCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<TermCount> = Vec::new();

    for event in events {
        let Some(term) = normalize_query(&event.query) else {
            continue;
        };
        match index.get(&term) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(term.clone(), counts.len());
                counts.push(TermCount { term, count: 1 });
            }
        }
    }

    // Stable sort preserves first-seen order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// The aggregator job.
pub struct Aggregator {
    config: AggregatorConfig,
    events: Arc<dyn EventStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl Aggregator {
    pub fn new(
        config: AggregatorConfig,
        events: Arc<dyn EventStore>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            config,
            events,
            catalog,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Run one aggregation pass against the window ending at `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<AggregationReport, JobError> {
        let window_start = now
            .checked_sub_signed(Duration::hours(i64::from(self.config.window_hours)))
            .ok_or_else(|| JobError::WindowOutOfRange {
                job: JobKind::Aggregation,
                span: format!("{}h", self.config.window_hours),
            })?;

        let events = self.events.events_since(window_start).await?;
        let mut ranked = rank_terms(&events);
        let terms_aggregated = ranked.len();
        ranked.truncate(self.config.top_terms);

        let mut batch = Vec::new();
        for term in &ranked {
            match self.catalog.find_by_slug(&term.term).await? {
                Some(entry) => {
                    debug!(slug = %entry.slug, count = term.count, "Matched trending term");
                    batch.push(CatalogWrite::SetSearchScore {
                        slug: entry.slug,
                        count: term.count,
                        updated_at: now,
                    });
                }
                None => debug!(term = %term.term, "No catalog entry for term"),
            }
        }

        let entries_updated = self.catalog.commit(&batch).await?;

        info!(
            events_scanned = events.len(),
            terms_aggregated,
            top_terms = ranked.len(),
            entries_updated,
            "Aggregated search events"
        );

        Ok(AggregationReport {
            window_start,
            events_scanned: events.len(),
            terms_aggregated,
            top_terms: ranked,
            entries_updated,
        })
    }
}
