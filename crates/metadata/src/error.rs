//! Metadata store error types.

use thiserror::Error;

/// Metadata store operation errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MetadataError {
    /// Translate a unique-constraint violation into [`MetadataError::Conflict`].
    ///
    /// Both SQLite and PostgreSQL report the violation through
    /// [`sqlx::error::DatabaseError::is_unique_violation`]; any other error is
    /// passed through as [`MetadataError::Database`].
    pub(crate) fn from_insert(err: sqlx::Error, what: impl FnOnce() -> String) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Conflict(format!("{}: {}", what(), db_err.message()))
            }
            other => Self::Database(other),
        }
    }
}

impl From<std::io::Error> for MetadataError {
    fn from(e: std::io::Error) -> Self {
        MetadataError::Config(e.to_string())
    }
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_insert_passes_through_non_database_errors() {
        let err = MetadataError::from_insert(sqlx::Error::RowNotFound, || "lfdi abc".to_string());
        assert!(matches!(err, MetadataError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_display() {
        let err = MetadataError::Conflict("lfdi 'abc' already exists".to_string());
        assert_eq!(err.to_string(), "conflict: lfdi 'abc' already exists");
    }
}
