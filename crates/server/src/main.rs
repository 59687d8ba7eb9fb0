use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use readtrend_core::{
    create_audit_system, load_config, validate_config, AuditEvent, AuditStore, CatalogStore,
    ClubStore, EventStore, SqliteAuditStore, SqliteStore, TrendingJobs,
};

use readtrend_server::api::create_router;
use readtrend_server::scheduler::JobScheduler;
use readtrend_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for audit event channel
const AUDIT_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let json_logs = std::env::var("READTREND_LOG_FORMAT").is_ok_and(|f| f == "json");
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let config_path = std::env::var("READTREND_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    let audit_store: Arc<dyn AuditStore> = Arc::new(
        SqliteAuditStore::new(&config.database.path).context("Failed to create audit store")?,
    );
    info!("Audit store initialized");

    let store = Arc::new(
        SqliteStore::new(&config.database.path).context("Failed to open trending store")?,
    );
    let events: Arc<dyn EventStore> = store.clone();
    let catalog: Arc<dyn CatalogStore> = store.clone();
    let clubs: Arc<dyn ClubStore> = store;
    info!("Trending store initialized");

    let (audit_handle, audit_writer) =
        create_audit_system(Arc::clone(&audit_store), AUDIT_BUFFER_SIZE);
    let writer_handle = tokio::spawn(audit_writer.run());

    audit_handle
        .emit(AuditEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
        })
        .await;
    info!("Emitted ServiceStarted audit event");

    let jobs = Arc::new(
        TrendingJobs::new(
            config.trending.clone(),
            Arc::clone(&events),
            Arc::clone(&catalog),
            Arc::clone(&clubs),
        )
        .with_timeout(Duration::from_secs(config.scheduler.job_timeout_secs))
        .with_audit(audit_handle.clone()),
    );

    let scheduler = if config.scheduler.enabled {
        let scheduler = Arc::new(JobScheduler::new(
            config.scheduler.clone(),
            Arc::clone(&jobs),
        ));
        scheduler.start().await;
        Some(scheduler)
    } else {
        info!("Scheduler disabled in config, jobs run only when triggered");
        None
    };

    let mut state = AppState::new(
        config.clone(),
        audit_store,
        events,
        catalog,
        clubs,
        Arc::clone(&jobs),
    );
    if let Some(ref scheduler) = scheduler {
        state = state.with_scheduler(Arc::clone(scheduler));
    }

    let app = create_router(Arc::new(state));

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(ref scheduler) = scheduler {
        scheduler.stop().await;
    }

    info!("Server shutting down...");
    audit_handle
        .emit(AuditEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // Every AuditHandle clone must go before the writer sees its channel close.
    drop(scheduler);
    drop(jobs);
    drop(audit_handle);

    let _ = writer_handle.await;
    info!("Audit writer stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
