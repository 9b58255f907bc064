//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid lfdi: {0}")]
    InvalidLfdi(String),

    #[error("invalid paging parameter: {0}")]
    InvalidPaging(String),

    #[error("certificate request requires either an id or an lfdi")]
    MissingIdentifier,
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
