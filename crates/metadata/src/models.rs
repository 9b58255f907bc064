//! Database models mapping to the metadata schema.

use gridkeep_core::Lfdi;
use sqlx::FromRow;
use time::OffsetDateTime;

// =============================================================================
// Aggregators
// =============================================================================

/// Aggregator record. Maintained outside the admin API; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AggregatorRow {
    pub aggregator_id: i64,
    pub name: String,
    pub created_time: OffsetDateTime,
    pub changed_time: OffsetDateTime,
}

// =============================================================================
// Certificates
// =============================================================================

/// Certificate record, shared by every aggregator it is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CertificateRow {
    pub certificate_id: i64,
    pub lfdi: String,
    /// Set by the store at insertion time.
    pub created: OffsetDateTime,
    pub expiry: OffsetDateTime,
}

/// A certificate that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCertificate {
    pub lfdi: Lfdi,
    pub expiry: OffsetDateTime,
}

impl NewCertificate {
    pub fn new(lfdi: Lfdi, expiry: OffsetDateTime) -> Self {
        Self { lfdi, expiry }
    }
}
