//! Server test utilities.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use gridkeep_core::config::{AppConfig, MetadataConfig};
use gridkeep_metadata::{MetadataStore, SqliteStore};
use gridkeep_server::{AppState, create_router};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use time::OffsetDateTime;
use tower::ServiceExt;

pub const LFDI_1: &str = "854d10a201ca99e5e90d3c3e1f9bc1c3bd075f3b";
pub const LFDI_2: &str = "403ba02aa36fa072c47eb3299daaafe94399adad";
pub const LFDI_3: &str = "8ad1d4ce1d3b353ebee63b0b3b8a4dc8e9ba9f2d";
pub const NEW_LFDI: &str = "aa11bb22cc33dd44ee55ff6677889900aabbccdd";
pub const EXPIRY: &str = "2037-01-01T00:00:00Z";

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub store: Arc<SqliteStore>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server backed by a temporary SQLite database.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let db_path = temp_dir.path().join("metadata.db");
        let store = Arc::new(
            SqliteStore::new(&db_path, None)
                .await
                .expect("Failed to create metadata store"),
        );

        let mut config = AppConfig::for_testing();
        config.metadata = MetadataConfig::Sqlite {
            path: db_path,
            query_timeout_secs: None,
        };
        modifier(&mut config);

        let metadata: Arc<dyn MetadataStore> = store.clone();
        let state = AppState::new(config, metadata);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            store,
            _temp_dir: temp_dir,
        }
    }

    /// Insert an aggregator directly; the API does not create aggregators.
    pub async fn insert_aggregator(&self, name: &str) -> i64 {
        let now = OffsetDateTime::now_utc();
        sqlx::query_scalar(
            "INSERT INTO aggregators (name, created_time, changed_time) VALUES (?, ?, ?) RETURNING aggregator_id",
        )
        .bind(name)
        .bind(now)
        .bind(now)
        .fetch_one(self.store.pool())
        .await
        .expect("Failed to insert aggregator")
    }

    /// Register a certificate through the API and return its id.
    pub async fn create_certificate(&self, lfdi: &str) -> i64 {
        let (status, body) = self
            .request(
                "POST",
                "/v1/admin/certificates",
                Some(json!({ "lfdi": lfdi, "expiry": EXPIRY })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create certificate: {body}");
        body["certificate_id"].as_i64().expect("certificate_id")
    }

    pub async fn certificate_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM certificates")
            .fetch_one(self.store.pool())
            .await
            .expect("Failed to count certificates")
    }

    /// Send a request with an optional JSON body and decode the JSON reply.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = match body {
            Some(v) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    /// Send a prepared request and decode the JSON reply.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_json: serde_json::Value = if body_bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, body_json)
    }
}
