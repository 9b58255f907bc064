//! PostgreSQL-based metadata store implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::*;
use crate::repos::{AggregatorRepo, AssignmentRepo, CertificateRepo};
use crate::store::{MetadataStore, MetadataTx, assignment_error};
use async_trait::async_trait;
use gridkeep_core::config::PgSslMode;
use gridkeep_core::{Lfdi, Paging};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::{Pool, Postgres, Transaction};
use std::str::FromStr;
use time::OffsetDateTime;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Create a new PostgreSQL store from individual connection parameters.
    ///
    /// This allows credentials to be passed separately, e.g. the password
    /// through an environment variable.
    #[allow(clippy::too_many_arguments)]
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        if let Some(mode) = ssl_mode {
            let sqlx_mode = match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            };
            opts = opts.ssl_mode(sqlx_mode);
        }

        // Log connection info without password
        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "Connecting to PostgreSQL with individual parameters"
        );

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{}ms", timeout_ms))]);
            tracing::info!("PostgreSQL statement_timeout set to {}ms", timeout_ms);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn begin(&self) -> MetadataResult<Box<dyn MetadataTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTx { tx }))
    }

    async fn migrate(&self) -> MetadataResult<()> {
        // PostgreSQL doesn't allow multiple statements in a single prepared statement,
        // so we split the schema and execute each statement separately.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Transaction handle for [`PostgresStore`].
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl MetadataTx for PostgresTx {
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
impl AggregatorRepo for PostgresTx {
    async fn count_all_aggregators(&mut self) -> MetadataResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM aggregators")
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count as u64)
    }

    async fn select_all_aggregators(&mut self, paging: Paging) -> MetadataResult<Vec<AggregatorRow>> {
        let rows = sqlx::query_as::<_, AggregatorRow>(
            "SELECT * FROM aggregators ORDER BY aggregator_id ASC LIMIT $1 OFFSET $2",
        )
        .bind(paging.sql_limit())
        .bind(paging.sql_offset())
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn select_aggregator(&mut self, aggregator_id: i64) -> MetadataResult<Option<AggregatorRow>> {
        let row =
            sqlx::query_as::<_, AggregatorRow>("SELECT * FROM aggregators WHERE aggregator_id = $1")
                .bind(aggregator_id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(row)
    }
}

#[async_trait]
impl CertificateRepo for PostgresTx {
    async fn count_all_certificates(&mut self) -> MetadataResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM certificates")
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count as u64)
    }

    async fn select_all_certificates(&mut self, paging: Paging) -> MetadataResult<Vec<CertificateRow>> {
        let rows = sqlx::query_as::<_, CertificateRow>(
            "SELECT * FROM certificates ORDER BY certificate_id ASC LIMIT $1 OFFSET $2",
        )
        .bind(paging.sql_limit())
        .bind(paging.sql_offset())
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn select_certificate(&mut self, certificate_id: i64) -> MetadataResult<Option<CertificateRow>> {
        let row = sqlx::query_as::<_, CertificateRow>(
            "SELECT * FROM certificates WHERE certificate_id = $1",
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
        if certificate_ids.is_empty() {
            return Ok(Vec::new());
        }

        // PostgreSQL supports ANY($1) with array parameter - much cleaner than dynamic IN
        let rows = sqlx::query_as::<_, CertificateRow>(
            "SELECT * FROM certificates WHERE certificate_id = ANY($1) ORDER BY certificate_id ASC",
        )
        .bind(certificate_ids)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn select_certificates_by_lfdis(
        &mut self,
        lfdis: &[Lfdi],
    ) -> MetadataResult<Vec<CertificateRow>> {
        if lfdis.is_empty() {
            return Ok(Vec::new());
        }

        let lfdis: Vec<&str> = lfdis.iter().map(Lfdi::as_str).collect();
        let rows = sqlx::query_as::<_, CertificateRow>(
            "SELECT * FROM certificates WHERE lfdi = ANY($1) ORDER BY certificate_id ASC",
        )
        .bind(&lfdis)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn insert_certificate(
        &mut self,
        certificate: &NewCertificate,
    ) -> MetadataResult<CertificateRow> {
        let row = sqlx::query_as::<_, CertificateRow>(
            r#"
            INSERT INTO certificates (lfdi, created, expiry)
            VALUES ($1, $2, $3)
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
impl AssignmentRepo for PostgresTx {
    async fn count_certificates_for_aggregator(&mut self, aggregator_id: i64) -> MetadataResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM aggregator_certificate_assignments WHERE aggregator_id = $1",
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
            WHERE a.aggregator_id = $1
            ORDER BY c.certificate_id ASC
            LIMIT $2 OFFSET $3
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
                VALUES ($1, $2)
                ON CONFLICT (aggregator_id, certificate_id) DO NOTHING
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
            "DELETE FROM aggregator_certificate_assignments WHERE aggregator_id = $1 AND certificate_id = $2",
        )
        .bind(aggregator_id)
        .bind(certificate_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_skip_comments() {
        let statements = postgres_schema_statements(POSTGRES_SCHEMA);
        assert_eq!(statements.len(), 4);
        assert!(statements.iter().all(|s| s.contains("CREATE")));
    }
}
