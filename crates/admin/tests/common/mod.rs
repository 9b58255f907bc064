//! Common test utilities and fixtures.

use gridkeep_admin::certificate::{add_certificate, add_many_certificates_for_aggregator};
use gridkeep_core::{CertificateAssignmentRequest, Lfdi};
use gridkeep_metadata::models::CertificateRow;
use gridkeep_metadata::{MetadataStore, MetadataTx, SqliteStore};
use std::sync::Arc;
use tempfile::TempDir;
use time::OffsetDateTime;
use time::macros::datetime;

pub const LFDI_1: &str = "854d10a201ca99e5e90d3c3e1f9bc1c3bd075f3b";
pub const LFDI_2: &str = "403ba02aa36fa072c47eb3299daaafe94399adad";
pub const LFDI_3: &str = "8ad1d4ce1d3b353ebee63b0b3b8a4dc8e9ba9f2d";
pub const LFDI_4: &str = "ec08e4c9d68a0669c3673708186fde317f7c67ca";
pub const LFDI_5: &str = "10c4ef1bd1e1a3f54ddbd9e4c1d6d3e2c0dd0c5a";

pub const EXPIRY: OffsetDateTime = datetime!(2037-01-01 00:00 UTC);

/// Temporary SQLite store seeded with aggregators and certificates.
///
/// Aggregator 1 holds certificates 1, 2, 3; aggregator 2 holds 4; aggregator 3
/// holds 5; aggregator 4 holds nothing.
#[allow(dead_code)]
pub struct TestDb {
    pub store: Arc<SqliteStore>,
    pub aggregators: Vec<i64>,
    pub certificates: Vec<CertificateRow>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestDb {
    pub async fn empty() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let store = SqliteStore::new(&temp_dir.path().join("test.db"), None)
            .await
            .expect("Failed to create SQLite store");
        Self {
            store: Arc::new(store),
            aggregators: Vec::new(),
            certificates: Vec::new(),
            _temp_dir: temp_dir,
        }
    }

    pub async fn seeded() -> Self {
        let mut db = Self::empty().await;
        for name in ["agg-one", "agg-two", "agg-three", "agg-empty"] {
            let id = db.insert_aggregator(name).await;
            db.aggregators.push(id);
        }

        let mut tx = db.begin().await;
        for lfdi in [LFDI_1, LFDI_2, LFDI_3, LFDI_4, LFDI_5] {
            let cert = add_certificate(tx.as_mut(), Lfdi::parse(lfdi).unwrap(), EXPIRY)
                .await
                .expect("Failed to create certificate");
            db.certificates.push(cert);
        }
        let layout: [(usize, &[usize]); 3] = [(0, &[0, 1, 2]), (1, &[3]), (2, &[4])];
        for (agg_idx, cert_idxs) in layout {
            let requests: Vec<_> = cert_idxs
                .iter()
                .map(|&i| CertificateAssignmentRequest::by_id(db.certificates[i].certificate_id))
                .collect();
            add_many_certificates_for_aggregator(tx.as_mut(), db.aggregators[agg_idx], &requests)
                .await
                .expect("Failed to assign certificates");
        }
        tx.commit().await.expect("Failed to commit seed");
        db
    }

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

    pub async fn begin(&self) -> Box<dyn MetadataTx> {
        self.store.begin().await.expect("Failed to begin transaction")
    }

    pub async fn certificate_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM certificates")
            .fetch_one(self.store.pool())
            .await
            .expect("Failed to count certificates")
    }

    pub async fn assignment_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM aggregator_certificate_assignments")
            .fetch_one(self.store.pool())
            .await
            .expect("Failed to count assignments")
    }
}
