//! Common test utilities and fixtures.

use gridkeep_core::Lfdi;
use gridkeep_metadata::models::{CertificateRow, NewCertificate};
use gridkeep_metadata::repos::{AssignmentRepo, CertificateRepo};
use gridkeep_metadata::{
    MetadataError, MetadataResult, MetadataStore, MetadataTx, PostgresStore, SqliteStore,
};
use std::future::Future;
use std::sync::Arc;
use tempfile::TempDir;
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use time::OffsetDateTime;
use time::macros::datetime;

/// Stable prefix for Docker/container startup failures in Postgres test setup.
/// Tests use this marker to decide whether to skip due to unavailable Docker.
pub const POSTGRES_CONTAINER_START_ERR_PREFIX: &str = "postgres-container-start:";

pub const LFDI_1: &str = "854d10a201ca99e5e90d3c3e1f9bc1c3bd075f3b";
pub const LFDI_2: &str = "403ba02aa36fa072c47eb3299daaafe94399adad";
pub const LFDI_3: &str = "8ad1d4ce1d3b353ebee63b0b3b8a4dc8e9ba9f2d";
pub const LFDI_4: &str = "ec08e4c9d68a0669c3673708186fde317f7c67ca";
pub const LFDI_5: &str = "10c4ef1bd1e1a3f54ddbd9e4c1d6d3e2c0dd0c5a";

/// A metadata store under test, backed by SQLite or a PostgreSQL container.
#[allow(dead_code)]
pub enum TestDb {
    Sqlite {
        store: Arc<SqliteStore>,
        _temp_dir: TempDir,
    },
    Postgres {
        store: Arc<PostgresStore>,
        _container: ContainerAsync<Postgres>,
    },
}

/// Ids created by [`TestDb::seed_base`].
///
/// Aggregator 1 holds certificates 1, 2, 3; aggregator 2 holds 4; aggregator 3
/// holds 5.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct BaseFixture {
    pub aggregators: Vec<i64>,
    pub certificates: Vec<CertificateRow>,
}

#[allow(dead_code)]
impl TestDb {
    /// Create a new SQLite store in a temporary directory.
    pub async fn sqlite() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let store = SqliteStore::new(&db_path, None)
            .await
            .expect("Failed to create SQLite store");
        Self::Sqlite {
            store: Arc::new(store),
            _temp_dir: temp_dir,
        }
    }

    /// Create a new PostgreSQL store backed by a testcontainer.
    pub async fn postgres() -> MetadataResult<Self> {
        let container = Postgres::default()
            .with_tag("15-alpine")
            .start()
            .await
            .map_err(|e| {
                MetadataError::Internal(format!(
                    "{} Failed to start PostgreSQL container: {e}",
                    POSTGRES_CONTAINER_START_ERR_PREFIX
                ))
            })?;

        let host = container.get_host().await.expect("Failed to get host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get port");

        // Default credentials from testcontainers-modules postgres
        let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
        let store = PostgresStore::from_url(&url, 5, None).await?;

        Ok(Self::Postgres {
            store: Arc::new(store),
            _container: container,
        })
    }

    /// Get the store as a trait object.
    pub fn store(&self) -> Arc<dyn MetadataStore> {
        match self {
            Self::Sqlite { store, .. } => store.clone(),
            Self::Postgres { store, .. } => store.clone(),
        }
    }

    /// Insert an aggregator directly; the admin API never writes aggregators.
    pub async fn insert_aggregator(&self, name: &str) -> i64 {
        let now = OffsetDateTime::now_utc();
        match self {
            Self::Sqlite { store, .. } => sqlx::query_scalar(
                "INSERT INTO aggregators (name, created_time, changed_time) VALUES (?, ?, ?) RETURNING aggregator_id",
            )
            .bind(name)
            .bind(now)
            .bind(now)
            .fetch_one(store.pool())
            .await
            .expect("Failed to insert aggregator"),
            Self::Postgres { store, .. } => sqlx::query_scalar(
                "INSERT INTO aggregators (name, created_time, changed_time) VALUES ($1, $2, $3) RETURNING aggregator_id",
            )
            .bind(name)
            .bind(now)
            .bind(now)
            .fetch_one(store.pool())
            .await
            .expect("Failed to insert aggregator"),
        }
    }

    /// Populate three aggregators and five certificates.
    pub async fn seed_base(&self) -> BaseFixture {
        let mut aggregators = Vec::new();
        for name in ["agg-1", "agg-2", "agg-3"] {
            aggregators.push(self.insert_aggregator(name).await);
        }

        let store = self.store();
        let mut tx = store.begin().await.expect("Failed to begin");
        let mut certificates = Vec::new();
        for (lfdi, expiry) in [
            (LFDI_1, datetime!(2037-01-01 01:02:03 UTC)),
            (LFDI_2, datetime!(2037-01-01 02:03:04 UTC)),
            (LFDI_3, datetime!(2037-01-01 03:04:05 UTC)),
            (LFDI_4, datetime!(2037-01-01 04:05:06 UTC)),
            (LFDI_5, datetime!(2037-01-01 05:06:07 UTC)),
        ] {
            let cert = tx
                .insert_certificate(&NewCertificate::new(Lfdi::parse(lfdi).unwrap(), expiry))
                .await
                .expect("Failed to insert certificate");
            certificates.push(cert);
        }

        let ids: Vec<i64> = certificates.iter().map(|c| c.certificate_id).collect();
        tx.assign_certificates(aggregators[0], &ids[0..3])
            .await
            .expect("Failed to assign");
        tx.assign_certificates(aggregators[1], &ids[3..4])
            .await
            .expect("Failed to assign");
        tx.assign_certificates(aggregators[2], &ids[4..5])
            .await
            .expect("Failed to assign");
        tx.commit().await.expect("Failed to commit");

        BaseFixture {
            aggregators,
            certificates,
        }
    }
}

/// Run a test against both SQLite and PostgreSQL backends.
///
/// PostgreSQL is skipped when SKIP_POSTGRES_TESTS is set or Docker is unavailable.
#[allow(dead_code)]
pub async fn run_metadata_test_both<F, Fut>(test_fn: F)
where
    F: Fn(Arc<TestDb>) -> Fut,
    Fut: Future<Output = ()>,
{
    test_fn(Arc::new(TestDb::sqlite().await)).await;

    if std::env::var("SKIP_POSTGRES_TESTS").is_err() {
        match TestDb::postgres().await {
            Ok(postgres) => test_fn(Arc::new(postgres)).await,
            Err(err) => {
                let msg = err.to_string();
                if msg.contains(POSTGRES_CONTAINER_START_ERR_PREFIX) {
                    eprintln!("Skipping PostgreSQL test (Docker unavailable): {msg}");
                } else {
                    panic!("PostgreSQL test setup failed: {msg}");
                }
            }
        }
    }
}
