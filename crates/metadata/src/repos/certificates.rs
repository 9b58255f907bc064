//! Certificate repository.

use crate::error::MetadataResult;
use crate::models::{CertificateRow, NewCertificate};
use async_trait::async_trait;
use gridkeep_core::{Lfdi, Paging};

/// Repository for certificate records.
#[async_trait]
pub trait CertificateRepo: Send {
    /// Count every certificate.
    async fn count_all_certificates(&mut self) -> MetadataResult<u64>;

    /// Select a window of certificates ordered by id ascending.
    async fn select_all_certificates(&mut self, paging: Paging)
    -> MetadataResult<Vec<CertificateRow>>;

    /// Get a certificate by ID.
    async fn select_certificate(&mut self, certificate_id: i64)
    -> MetadataResult<Option<CertificateRow>>;

    /// Get the certificates matching any of `certificate_ids`, ordered by id.
    /// Unknown ids are simply absent from the result.
    async fn select_certificates_by_ids(
        &mut self,
        certificate_ids: &[i64],
    ) -> MetadataResult<Vec<CertificateRow>>;

    /// Get the certificates matching any of `lfdis`, ordered by id.
    async fn select_certificates_by_lfdis(
        &mut self,
        lfdis: &[Lfdi],
    ) -> MetadataResult<Vec<CertificateRow>>;

    /// Insert a certificate, stamping `created` with the current time.
    ///
    /// Fails with `MetadataError::Conflict` when the LFDI already exists.
    async fn insert_certificate(
        &mut self,
        certificate: &NewCertificate,
    ) -> MetadataResult<CertificateRow>;
}
