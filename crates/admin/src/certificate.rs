//! Certificate manager: the per-aggregator certificate listing, batch
//! assignment, unassignment, and the certificate catalogue.

use std::collections::{BTreeSet, HashMap};

use crate::error::{AdminError, AdminResult};
use crate::page::CertificatePage;
use gridkeep_core::{CertificateAssignmentRequest, CertificateSelector, Lfdi, Paging};
use gridkeep_metadata::MetadataTx;
use gridkeep_metadata::models::{CertificateRow, NewCertificate};
use gridkeep_metadata::repos::{AggregatorRepo, AssignmentRepo, CertificateRepo};
use time::OffsetDateTime;
use tracing::{debug, info};

/// What a batch assignment changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentSummary {
    /// Certificates created because their LFDI was unknown.
    pub certificates_created: u64,
    /// Assignment rows created; pairs that already existed are not counted.
    pub assignments_created: u64,
}

async fn require_aggregator(tx: &mut dyn MetadataTx, aggregator_id: i64) -> AdminResult<()> {
    match tx.select_aggregator(aggregator_id).await? {
        Some(_) => Ok(()),
        None => Err(AdminError::NotFound(format!(
            "aggregator {aggregator_id} not found"
        ))),
    }
}

/// List the certificates assigned to an aggregator.
///
/// Returns `None` when the aggregator does not exist, as opposed to an empty
/// page for an aggregator with no certificates.
pub async fn fetch_many_certificates_for_aggregator(
    tx: &mut dyn MetadataTx,
    aggregator_id: i64,
    paging: Paging,
) -> AdminResult<Option<CertificatePage>> {
    if tx.select_aggregator(aggregator_id).await?.is_none() {
        return Ok(None);
    }

    let total_count = tx.count_certificates_for_aggregator(aggregator_id).await?;
    let certificates = tx
        .select_certificates_for_aggregator(aggregator_id, paging)
        .await?;
    Ok(Some(CertificatePage::new(paging, total_count, certificates)))
}

/// Requests with only an LFDI, collapsed by value in first-seen order.
#[derive(Default)]
struct LfdiRequests {
    order: Vec<Lfdi>,
    expiries: HashMap<Lfdi, Option<OffsetDateTime>>,
}

impl LfdiRequests {
    fn push(&mut self, lfdi: Lfdi, expiry: Option<OffsetDateTime>) {
        match self.expiries.get_mut(&lfdi) {
            Some(existing) => {
                if existing.is_none() {
                    *existing = expiry;
                }
            }
            None => {
                self.order.push(lfdi.clone());
                self.expiries.insert(lfdi, expiry);
            }
        }
    }

    fn expiry(&self, lfdi: &Lfdi) -> Option<OffsetDateTime> {
        self.expiries.get(lfdi).copied().flatten()
    }
}

/// Assign a batch of certificates to an aggregator.
///
/// Requests naming a `certificate_id` must refer to existing certificates.
/// Requests naming only an `lfdi` reuse the stored certificate when there is
/// one, otherwise a certificate is created with the supplied expiry. The
/// whole batch is validated before anything is written, but the transaction
/// is the unit of atomicity: on any error the caller must roll it back.
pub async fn add_many_certificates_for_aggregator(
    tx: &mut dyn MetadataTx,
    aggregator_id: i64,
    requests: &[CertificateAssignmentRequest],
) -> AdminResult<AssignmentSummary> {
    require_aggregator(tx, aggregator_id).await?;

    let mut requested_ids = BTreeSet::new();
    let mut lfdi_requests = LfdiRequests::default();
    for (index, request) in requests.iter().enumerate() {
        match request.selector() {
            Ok(CertificateSelector::ById(id)) => {
                requested_ids.insert(id);
            }
            Ok(CertificateSelector::ByLfdi { lfdi, expiry }) => lfdi_requests.push(lfdi, expiry),
            Err(gridkeep_core::Error::MissingIdentifier) => {
                return Err(AdminError::MissingIdentifier { index });
            }
            Err(source) => return Err(AdminError::InvalidLfdi { index, source }),
        }
    }

    let mut resolved: BTreeSet<i64> = BTreeSet::new();

    if !requested_ids.is_empty() {
        let ids: Vec<i64> = requested_ids.iter().copied().collect();
        let found: BTreeSet<i64> = tx
            .select_certificates_by_ids(&ids)
            .await?
            .into_iter()
            .map(|c| c.certificate_id)
            .collect();
        let unknown: Vec<i64> = requested_ids.difference(&found).copied().collect();
        if !unknown.is_empty() {
            return Err(AdminError::InvalidId(unknown));
        }
        resolved.extend(found);
    }

    let mut to_create = Vec::new();
    if !lfdi_requests.order.is_empty() {
        let existing: HashMap<String, i64> = tx
            .select_certificates_by_lfdis(&lfdi_requests.order)
            .await?
            .into_iter()
            .map(|c| (c.lfdi, c.certificate_id))
            .collect();

        for lfdi in &lfdi_requests.order {
            if let Some(&certificate_id) = existing.get(lfdi.as_str()) {
                debug!(aggregator_id, certificate_id, lfdi = %lfdi, "Reusing existing certificate");
                resolved.insert(certificate_id);
                continue;
            }
            let expiry = lfdi_requests
                .expiry(lfdi)
                .ok_or_else(|| AdminError::MissingExpiry {
                    lfdi: lfdi.to_string(),
                })?;
            to_create.push(NewCertificate::new(lfdi.clone(), expiry));
        }
    }

    let mut summary = AssignmentSummary::default();
    for new_certificate in &to_create {
        let created = tx.insert_certificate(new_certificate).await?;
        info!(
            aggregator_id,
            certificate_id = created.certificate_id,
            lfdi = %created.lfdi,
            "Created certificate"
        );
        resolved.insert(created.certificate_id);
        summary.certificates_created += 1;
    }

    let certificate_ids: Vec<i64> = resolved.into_iter().collect();
    summary.assignments_created = tx.assign_certificates(aggregator_id, &certificate_ids).await?;

    info!(
        aggregator_id,
        requested = requests.len(),
        certificates_created = summary.certificates_created,
        assignments_created = summary.assignments_created,
        "Assigned certificates to aggregator"
    );

    Ok(summary)
}

/// Remove one certificate from an aggregator. The certificate itself is kept.
pub async fn unassign_certificate_for_aggregator(
    tx: &mut dyn MetadataTx,
    aggregator_id: i64,
    certificate_id: i64,
) -> AdminResult<()> {
    require_aggregator(tx, aggregator_id).await?;

    if tx.select_certificate(certificate_id).await?.is_none() {
        return Err(AdminError::NotFound(format!(
            "certificate {certificate_id} not found"
        )));
    }

    if !tx.unassign_certificate(aggregator_id, certificate_id).await? {
        return Err(AdminError::NotFound(format!(
            "certificate {certificate_id} is not assigned to aggregator {aggregator_id}"
        )));
    }

    info!(aggregator_id, certificate_id, "Unassigned certificate from aggregator");
    Ok(())
}

/// List a window of all certificates ordered by id, with the overall count.
pub async fn fetch_many_certificates(
    tx: &mut dyn MetadataTx,
    paging: Paging,
) -> AdminResult<CertificatePage> {
    let total_count = tx.count_all_certificates().await?;
    let certificates = tx.select_all_certificates(paging).await?;
    Ok(CertificatePage::new(paging, total_count, certificates))
}

/// Look up one certificate. `None` when no certificate has that id.
pub async fn fetch_single_certificate(
    tx: &mut dyn MetadataTx,
    certificate_id: i64,
) -> AdminResult<Option<CertificateRow>> {
    Ok(tx.select_certificate(certificate_id).await?)
}

/// Create a certificate outside of any aggregator.
///
/// Fails with [`AdminError::Conflict`] if the LFDI is already registered.
pub async fn add_certificate(
    tx: &mut dyn MetadataTx,
    lfdi: Lfdi,
    expiry: OffsetDateTime,
) -> AdminResult<CertificateRow> {
    let created = tx
        .insert_certificate(&NewCertificate::new(lfdi, expiry))
        .await?;
    info!(
        certificate_id = created.certificate_id,
        lfdi = %created.lfdi,
        "Created certificate"
    );
    Ok(created)
}
