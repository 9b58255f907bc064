//! Manager error taxonomy.

use gridkeep_metadata::MetadataError;
use thiserror::Error;

fn format_ids(ids: &[i64]) -> String {
    const MAX_DISPLAYED: usize = 5;
    let shown: Vec<String> = ids.iter().take(MAX_DISPLAYED).map(i64::to_string).collect();
    if ids.len() <= MAX_DISPLAYED {
        shown.join(", ")
    } else {
        format!("{} (and {} more)", shown.join(", "), ids.len() - MAX_DISPLAYED)
    }
}

/// Errors raised by the aggregator and certificate managers.
///
/// `NotFound`, `InvalidId` and `Conflict` are the recoverable kinds callers
/// are expected to handle; request validation failures are client errors as
/// well. Anything else from the store is carried unchanged in `Metadata`.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{0}")]
    NotFound(String),

    #[error("certificate id(s) do not exist: {}", format_ids(.0))]
    InvalidId(Vec<i64>),

    #[error("{0}")]
    Conflict(String),

    #[error("certificate request #{index} requires either an id or an lfdi")]
    MissingIdentifier { index: usize },

    #[error("certificate request #{index}: {source}")]
    InvalidLfdi {
        index: usize,
        #[source]
        source: gridkeep_core::Error,
    },

    #[error("certificate with lfdi '{lfdi}' does not exist and no expiry was supplied to create it")]
    MissingExpiry { lfdi: String },

    #[error(transparent)]
    Metadata(MetadataError),
}

impl AdminError {
    /// Short, stable name of the error kind, for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidId(_) => "invalid_id",
            Self::Conflict(_) => "conflict",
            Self::MissingIdentifier { .. } => "missing_identifier",
            Self::InvalidLfdi { .. } => "invalid_lfdi",
            Self::MissingExpiry { .. } => "missing_expiry",
            Self::Metadata(_) => "metadata",
        }
    }

    /// Whether the caller, rather than the system, is at fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Metadata(_))
    }
}

impl From<MetadataError> for AdminError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::NotFound(msg) => Self::NotFound(msg),
            MetadataError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Metadata(other),
        }
    }
}

/// Result type for manager operations.
pub type AdminResult<T> = std::result::Result<T, AdminError>;
