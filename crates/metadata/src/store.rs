//! Metadata store traits and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{AggregatorRepo, AssignmentRepo, CertificateRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// A unit of work against the metadata store.
///
/// Every repository call made through a `MetadataTx` runs inside one database
/// transaction. Nothing is visible to other sessions until [`commit`] succeeds;
/// [`rollback`] (or dropping the handle) discards every write.
///
/// [`commit`]: MetadataTx::commit
/// [`rollback`]: MetadataTx::rollback
#[async_trait]
pub trait MetadataTx: AggregatorRepo + CertificateRepo + AssignmentRepo + Send {
    /// Commit all writes made through this handle.
    async fn commit(self: Box<Self>) -> MetadataResult<()>;

    /// Discard all writes made through this handle.
    async fn rollback(self: Box<Self>) -> MetadataResult<()>;
}

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Start a new transaction.
    async fn begin(&self) -> MetadataResult<Box<dyn MetadataTx>>;

    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store.
    pub async fn new(
        path: impl AsRef<Path>,
        query_timeout_secs: Option<u64>,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();
        let query_timeout_secs = query_timeout_secs.unwrap_or(30);

        // Ensure parent directory exists
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits a single writer; one connection serialises transactions
            // instead of failing them with "database is locked".
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(query_timeout_secs))
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::warn!(
            query_timeout_secs = query_timeout_secs,
            "SQLite serialises all transactions through one connection. \
             Use PostgreSQL for deployments with concurrent administrators."
        );

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn begin(&self) -> MetadataResult<Box<dyn MetadataTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteTx { tx }))
    }

    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Transaction handle for [`SqliteStore`].
pub struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
}

// Implement all the repository traits for SqliteTx
mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use gridkeep_core::{Lfdi, Paging};
    use time::OffsetDateTime;

    /// SQLite has a limit of ~999 bound parameters per statement.
    const BATCH_SIZE: usize = 900;

    #[async_trait]
    impl MetadataTx for SqliteTx {
        async fn commit(self: Box<Self>) -> MetadataResult<()> {
            self.tx.commit().await?;
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> MetadataResult<()> {
            self.tx.rollback().await?;
            Ok(())
        }
    }

    #[async_trait]
    impl AggregatorRepo for SqliteTx {
        async fn count_all_aggregators(&mut self) -> MetadataResult<u64> {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM aggregators")
                .fetch_one(&mut *self.tx)
                .await?;
            Ok(count as u64)
        }

        async fn select_all_aggregators(
            &mut self,
            paging: Paging,
        ) -> MetadataResult<Vec<AggregatorRow>> {
            let rows = sqlx::query_as::<_, AggregatorRow>(
                "SELECT * FROM aggregators ORDER BY aggregator_id ASC LIMIT ? OFFSET ?",
            )
            .bind(paging.sql_limit())
            .bind(paging.sql_offset())
            .fetch_all(&mut *self.tx)
            .await?;
            Ok(rows)
        }

        async fn select_aggregator(
            &mut self,
            aggregator_id: i64,
        ) -> MetadataResult<Option<AggregatorRow>> {
            let row = sqlx::query_as::<_, AggregatorRow>(
                "SELECT * FROM aggregators WHERE aggregator_id = ?",
            )
            .bind(aggregator_id)
            .fetch_optional(&mut *self.tx)
            .await?;
            Ok(row)
        }
    }

    #[async_trait]
    impl CertificateRepo for SqliteTx {
        async fn count_all_certificates(&mut self) -> MetadataResult<u64> {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM certificates")
                .fetch_one(&mut *self.tx)
                .await?;
            Ok(count as u64)
        }

        async fn select_all_certificates(
            &mut self,
            paging: Paging,
        ) -> MetadataResult<Vec<CertificateRow>> {
            let rows = sqlx::query_as::<_, CertificateRow>(
                "SELECT * FROM certificates ORDER BY certificate_id ASC LIMIT ? OFFSET ?",
            )
            .bind(paging.sql_limit())
            .bind(paging.sql_offset())
            .fetch_all(&mut *self.tx)
            .await?;
            Ok(rows)
        }

        async fn select_certificate(
            &mut self,
            certificate_id: i64,
        ) -> MetadataResult<Option<CertificateRow>> {
            let row = sqlx::query_as::<_, CertificateRow>(
                "SELECT * FROM certificates WHERE certificate_id = ?",
            )
            .bind(certificate_id)
            .fetch_optional(&mut *self.tx)
            .await?;
            Ok(row)
        }

        async fn select_certificates_by_ids(
            &mut self,
            certificate_ids: &[i64],
        ) -> MetadataResult<Vec<CertificateRow>> {
            let mut result = Vec::with_capacity(certificate_ids.len());

            for batch in certificate_ids.chunks(BATCH_SIZE) {
                let placeholders: Vec<&str> = batch.iter().map(|_| "?").collect();
                let query = format!(
                    "SELECT * FROM certificates WHERE certificate_id IN ({})",
                    placeholders.join(", ")
                );

                let mut query_builder = sqlx::query_as::<_, CertificateRow>(&query);
                for id in batch {
                    query_builder = query_builder.bind(id);
                }
                result.extend(query_builder.fetch_all(&mut *self.tx).await?);
            }

            result.sort_by_key(|c| c.certificate_id);
            result.dedup_by_key(|c| c.certificate_id);
            Ok(result)
        }

        async fn select_certificates_by_lfdis(
            &mut self,
            lfdis: &[Lfdi],
        ) -> MetadataResult<Vec<CertificateRow>> {
            let mut result = Vec::with_capacity(lfdis.len());

            for batch in lfdis.chunks(BATCH_SIZE) {
                let placeholders: Vec<&str> = batch.iter().map(|_| "?").collect();
                let query = format!(
                    "SELECT * FROM certificates WHERE lfdi IN ({})",
                    placeholders.join(", ")
                );

                let mut query_builder = sqlx::query_as::<_, CertificateRow>(&query);
                for lfdi in batch {
                    query_builder = query_builder.bind(lfdi.as_str());
                }
                result.extend(query_builder.fetch_all(&mut *self.tx).await?);
            }

            result.sort_by_key(|c| c.certificate_id);
            result.dedup_by_key(|c| c.certificate_id);
            Ok(result)
        }

        async fn insert_certificate(
            &mut self,
            certificate: &NewCertificate,
        ) -> MetadataResult<CertificateRow> {
            let row = sqlx::query_as::<_, CertificateRow>(
                r#"
                INSERT INTO certificates (lfdi, created, expiry)
                VALUES (?, ?, ?)
                RETURNING certificate_id, lfdi, created, expiry
                "#,
            )
            .bind(certificate.lfdi.as_str())
            .bind(OffsetDateTime::now_utc())
            .bind(certificate.expiry)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| {
                MetadataError::from_insert(e, || {
                    format!("certificate with lfdi '{}' already exists", certificate.lfdi)
                })
            })?;
            Ok(row)
        }
    }

    #[async_trait]
    impl AssignmentRepo for SqliteTx {
        async fn count_certificates_for_aggregator(
            &mut self,
            aggregator_id: i64,
        ) -> MetadataResult<u64> {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM aggregator_certificate_assignments WHERE aggregator_id = ?",
            )
            .bind(aggregator_id)
            .fetch_one(&mut *self.tx)
            .await?;
            Ok(count as u64)
        }

        async fn select_certificates_for_aggregator(
            &mut self,
            aggregator_id: i64,
            paging: Paging,
        ) -> MetadataResult<Vec<CertificateRow>> {
            let rows = sqlx::query_as::<_, CertificateRow>(
                r#"
                SELECT c.certificate_id, c.lfdi, c.created, c.expiry
                FROM certificates c
                JOIN aggregator_certificate_assignments a ON a.certificate_id = c.certificate_id
                WHERE a.aggregator_id = ?
                ORDER BY c.certificate_id ASC
                LIMIT ? OFFSET ?
                "#,
            )
            .bind(aggregator_id)
            .bind(paging.sql_limit())
            .bind(paging.sql_offset())
            .fetch_all(&mut *self.tx)
            .await?;
            Ok(rows)
        }

        async fn assign_certificates(
            &mut self,
            aggregator_id: i64,
            certificate_ids: &[i64],
        ) -> MetadataResult<u64> {
            let mut created = 0;
            for certificate_id in certificate_ids {
                let result = sqlx::query(
                    r#"
                    INSERT INTO aggregator_certificate_assignments (aggregator_id, certificate_id)
                    VALUES (?, ?)
                    ON CONFLICT(aggregator_id, certificate_id) DO NOTHING
                    "#,
                )
                .bind(aggregator_id)
                .bind(certificate_id)
                .execute(&mut *self.tx)
                .await
                .map_err(|e| assignment_error(e, aggregator_id, *certificate_id))?;
                created += result.rows_affected();
            }
            Ok(created)
        }

        async fn unassign_certificate(
            &mut self,
            aggregator_id: i64,
            certificate_id: i64,
        ) -> MetadataResult<bool> {
            let result = sqlx::query(
                "DELETE FROM aggregator_certificate_assignments WHERE aggregator_id = ? AND certificate_id = ?",
            )
            .bind(aggregator_id)
            .bind(certificate_id)
            .execute(&mut *self.tx)
            .await?;
            Ok(result.rows_affected() > 0)
        }
    }
}

/// Map a foreign key failure on the assignment table to `NotFound`.
pub(crate) fn assignment_error(
    err: sqlx::Error,
    aggregator_id: i64,
    certificate_id: i64,
) -> MetadataError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            MetadataError::NotFound(format!(
                "aggregator {aggregator_id} or certificate {certificate_id} does not exist"
            ))
        }
        other => MetadataError::Database(other),
    }
}

/// SQL schema for SQLite.
const SCHEMA_SQL: &str = r#"
-- Aggregators (maintained outside the admin API)
CREATE TABLE IF NOT EXISTS aggregators (
    aggregator_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    created_time TEXT NOT NULL,
    changed_time TEXT NOT NULL
);

-- Certificates, shared across aggregators
CREATE TABLE IF NOT EXISTS certificates (
    certificate_id INTEGER PRIMARY KEY AUTOINCREMENT,
    lfdi TEXT NOT NULL UNIQUE,
    created TEXT NOT NULL,
    expiry TEXT NOT NULL
);

-- Aggregator <-> certificate junction
CREATE TABLE IF NOT EXISTS aggregator_certificate_assignments (
    assignment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    aggregator_id INTEGER NOT NULL REFERENCES aggregators(aggregator_id) ON DELETE CASCADE,
    certificate_id INTEGER NOT NULL REFERENCES certificates(certificate_id) ON DELETE CASCADE,
    UNIQUE(aggregator_id, certificate_id)
);
CREATE INDEX IF NOT EXISTS idx_assignments_certificate ON aggregator_certificate_assignments(certificate_id);
"#;
