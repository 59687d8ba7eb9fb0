pub mod audit;
pub mod config;
pub mod metrics;
pub mod store;
pub mod testing;
pub mod trending;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditFilter, AuditHandle, AuditRecord,
    AuditStore, AuditWriter, SqliteAuditStore,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    SchedulerConfig,
};
pub use store::{
    CatalogEntry, CatalogStore, CatalogWrite, Club, ClubStore, EventStore, SearchEvent,
    SqliteStore, StoreError, MAX_BATCH_WRITES,
};
pub use trending::{JobError, JobKind, JobReport, JobTrigger, TrendingConfig, TrendingJobs};
