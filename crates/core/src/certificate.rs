//! Certificate assignment requests.

use crate::lfdi::Lfdi;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One entry of a certificate assignment batch.
///
/// A certificate is identified either by `certificate_id` or by `lfdi`. When
/// an id is present it wins and the other fields are ignored. `expiry` is only
/// consulted when a new certificate has to be created for an unknown LFDI.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateAssignmentRequest {
    #[serde(default, alias = "id")]
    pub certificate_id: Option<i64>,
    #[serde(default)]
    pub lfdi: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expiry: Option<OffsetDateTime>,
}

/// How an assignment request resolves its certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CertificateSelector {
    /// Existing certificate referenced by id.
    ById(i64),
    /// Certificate looked up by LFDI, created with `expiry` if absent.
    ByLfdi {
        lfdi: Lfdi,
        expiry: Option<OffsetDateTime>,
    },
}

impl CertificateAssignmentRequest {
    /// Request an existing certificate by id.
    pub fn by_id(certificate_id: i64) -> Self {
        Self {
            certificate_id: Some(certificate_id),
            ..Default::default()
        }
    }

    /// Request a certificate by LFDI.
    pub fn by_lfdi(lfdi: impl Into<String>, expiry: Option<OffsetDateTime>) -> Self {
        Self {
            certificate_id: None,
            lfdi: Some(lfdi.into()),
            expiry,
        }
    }

    /// Classify the request, validating the LFDI when it is the identifier.
    pub fn selector(&self) -> crate::Result<CertificateSelector> {
        match (self.certificate_id, self.lfdi.as_deref()) {
            (Some(id), _) => Ok(CertificateSelector::ById(id)),
            (None, Some(lfdi)) => Ok(CertificateSelector::ByLfdi {
                lfdi: Lfdi::parse(lfdi)?,
                expiry: self.expiry,
            }),
            (None, None) => Err(crate::Error::MissingIdentifier),
        }
    }
}
