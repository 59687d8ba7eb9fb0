//! Trending pool publisher.
//!
//! Copies the current top slugs onto every club. Club writes are independent:
//! they run concurrently and one failure does not affect the others.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::store::{CatalogStore, ClubStore};

use super::config::PoolConfig;
use super::types::{JobError, PoolReport};

/// The pool publisher job.
pub struct PoolPublisher {
    config: PoolConfig,
    catalog: Arc<dyn CatalogStore>,
    clubs: Arc<dyn ClubStore>,
}

impl PoolPublisher {
    pub fn new(
        config: PoolConfig,
        catalog: Arc<dyn CatalogStore>,
        clubs: Arc<dyn ClubStore>,
    ) -> Self {
        Self {
            config,
            catalog,
            clubs,
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Publish the top `pool_size` slugs by `search_score_24h` to all clubs.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<PoolReport, JobError> {
        let pool: Vec<String> = self
            .catalog
            .top_by_search_score(self.config.pool_size)
            .await?
            .into_iter()
            .map(|entry| entry.slug)
            .collect();

        let clubs = self.clubs.list_clubs().await?;

        let writes: Vec<_> = clubs
            .iter()
            .map(|club| {
                let pool = &pool;
                async move {
                    let result = self.clubs.set_trending_pool(&club.id, pool, now).await;
                    (club.id.as_str(), result)
                }
            })
            .collect();

        let results = futures::future::join_all(writes).await;

        let mut clubs_updated = 0;
        let mut clubs_failed = 0;
        for (club_id, result) in results {
            match result {
                Ok(()) => clubs_updated += 1,
                Err(e) => {
                    warn!(club_id = %club_id, error = %e, "Failed to publish trending pool");
                    clubs_failed += 1;
                }
            }
        }

        info!(
            pool_size = pool.len(),
            clubs_total = clubs.len(),
            clubs_updated,
            clubs_failed,
            "Published trending pool"
        );

        Ok(PoolReport {
            pool,
            clubs_total: clubs.len(),
            clubs_updated,
            clubs_failed,
        })
    }
}
