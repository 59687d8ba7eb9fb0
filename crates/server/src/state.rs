use std::sync::Arc;

use readtrend_core::{
    AuditStore, CatalogStore, ClubStore, Config, EventStore, SanitizedConfig, TrendingJobs,
};

use crate::scheduler::JobScheduler;

/// Shared application state
pub struct AppState {
    config: Config,
    audit_store: Arc<dyn AuditStore>,
    events: Arc<dyn EventStore>,
    catalog: Arc<dyn CatalogStore>,
    clubs: Arc<dyn ClubStore>,
    jobs: Arc<TrendingJobs>,
    scheduler: Option<Arc<JobScheduler>>,
}

impl AppState {
    pub fn new(
        config: Config,
        audit_store: Arc<dyn AuditStore>,
        events: Arc<dyn EventStore>,
        catalog: Arc<dyn CatalogStore>,
        clubs: Arc<dyn ClubStore>,
        jobs: Arc<TrendingJobs>,
    ) -> Self {
        Self {
            config,
            audit_store,
            events,
            catalog,
            clubs,
            jobs,
            scheduler: None,
        }
    }

    pub fn with_scheduler(mut self, scheduler: Arc<JobScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn events(&self) -> &dyn EventStore {
        self.events.as_ref()
    }

    pub fn catalog(&self) -> &dyn CatalogStore {
        self.catalog.as_ref()
    }

    pub fn clubs(&self) -> &dyn ClubStore {
        self.clubs.as_ref()
    }

    pub fn jobs(&self) -> &TrendingJobs {
        &self.jobs
    }

    pub fn scheduler(&self) -> Option<&JobScheduler> {
        self.scheduler.as_deref()
    }
}
