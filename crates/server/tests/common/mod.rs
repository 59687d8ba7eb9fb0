//! In-process test fixture for the HTTP API.
//!
//! Builds the real router over file-backed SQLite stores in a temp dir,
//! with the audit writer running, so requests go through the same code
//! paths as the binary.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use readtrend_core::config::{DatabaseConfig, ServerConfig};
use readtrend_core::{
    create_audit_system, AuditStore, CatalogStore, ClubStore, Config, EventStore,
    SqliteAuditStore, SqliteStore, TrendingJobs,
};
use readtrend_server::api::create_router;
use readtrend_server::state::AppState;

use readtrend_core::testing::FlakyStore;

pub use readtrend_core::testing::fixtures;

pub struct TestFixture {
    pub router: Router,
    /// Direct access to the stores for seeding and assertions
    pub store: Arc<SqliteStore>,
    pub audit_store: Arc<dyn AuditStore>,
    /// Set by [`TestFixture::with_flaky_store`]; the router's stores go
    /// through it so tests can inject failures.
    pub flaky: Option<Arc<FlakyStore>>,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Build a fixture around `config`; the server and database sections
    /// are replaced with test values.
    pub async fn with_config(config: Config) -> Self {
        Self::build(config, false).await
    }

    /// A fixture whose router sees the stores through a [`FlakyStore`].
    pub async fn with_flaky_store() -> Self {
        Self::build(Config::default(), true).await
    }

    async fn build(mut config: Config, flaky: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        config.server = ServerConfig {
            host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            port: 0,
        };
        config.database = DatabaseConfig {
            path: db_path.clone(),
        };

        let audit_store: Arc<dyn AuditStore> = Arc::new(
            SqliteAuditStore::new(&db_path).expect("Failed to create audit store"),
        );
        let store = Arc::new(SqliteStore::new(&db_path).expect("Failed to create store"));

        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);
        tokio::spawn(audit_writer.run());

        let flaky = flaky.then(|| Arc::new(FlakyStore::new(Arc::clone(&store))));
        let (events, catalog, clubs) = match &flaky {
            Some(flaky) => (
                Arc::clone(flaky) as Arc<dyn EventStore>,
                Arc::clone(flaky) as Arc<dyn CatalogStore>,
                Arc::clone(flaky) as Arc<dyn ClubStore>,
            ),
            None => (
                Arc::clone(&store) as Arc<dyn EventStore>,
                Arc::clone(&store) as Arc<dyn CatalogStore>,
                Arc::clone(&store) as Arc<dyn ClubStore>,
            ),
        };

        let jobs = Arc::new(
            TrendingJobs::new(
                config.trending.clone(),
                Arc::clone(&events),
                Arc::clone(&catalog),
                Arc::clone(&clubs),
            )
            .with_timeout(Duration::from_secs(config.scheduler.job_timeout_secs))
            .with_audit(audit_handle),
        );

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&audit_store),
            events,
            catalog,
            clubs,
            jobs,
        ));

        Self {
            router: create_router(state),
            store,
            audit_store,
            flaky,
            temp_dir,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// POST with no body, for job triggers.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// GET returning the raw body text, for non-JSON endpoints.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
