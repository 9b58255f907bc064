//! Aggregator certificate assignment repository.

use crate::error::MetadataResult;
use crate::models::CertificateRow;
use async_trait::async_trait;
use gridkeep_core::Paging;

/// Repository for the aggregator/certificate junction.
#[async_trait]
pub trait AssignmentRepo: Send {
    /// Count the certificates assigned to an aggregator.
    async fn count_certificates_for_aggregator(&mut self, aggregator_id: i64)
    -> MetadataResult<u64>;

    /// Select a window of an aggregator's certificates ordered by certificate id.
    async fn select_certificates_for_aggregator(
        &mut self,
        aggregator_id: i64,
        paging: Paging,
    ) -> MetadataResult<Vec<CertificateRow>>;

    /// Assign certificates to an aggregator. Existing pairs are left alone.
    ///
    /// Returns the number of assignments that were created.
    async fn assign_certificates(
        &mut self,
        aggregator_id: i64,
        certificate_ids: &[i64],
    ) -> MetadataResult<u64>;

    /// Remove a single assignment. Returns `false` if the pair was not assigned.
    async fn unassign_certificate(
        &mut self,
        aggregator_id: i64,
        certificate_id: i64,
    ) -> MetadataResult<bool>;
}
