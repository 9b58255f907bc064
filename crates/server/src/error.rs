//! API error types.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gridkeep_admin::AdminError;
use gridkeep_metadata::MetadataError;
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("{0}")]
    Core(#[from] gridkeep_core::Error),
}

fn metadata_status(err: &MetadataError) -> StatusCode {
    match err {
        MetadataError::NotFound(_) => StatusCode::NOT_FOUND,
        // Integrity failures are reported as client errors, not 409.
        MetadataError::Conflict(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Admin(AdminError::Metadata(_)) => "metadata_error",
            Self::Admin(e) => e.kind(),
            Self::Metadata(MetadataError::NotFound(_)) => "not_found",
            Self::Metadata(MetadataError::Conflict(_)) => "conflict",
            Self::Metadata(_) => "metadata_error",
            Self::Core(gridkeep_core::Error::InvalidLfdi(_)) => "invalid_lfdi",
            Self::Core(gridkeep_core::Error::InvalidPaging(_)) => "invalid_paging",
            Self::Core(gridkeep_core::Error::MissingIdentifier) => "missing_identifier",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Admin(e) => match e {
                AdminError::NotFound(_) => StatusCode::NOT_FOUND,
                AdminError::Metadata(inner) => metadata_status(inner),
                AdminError::InvalidId(_)
                | AdminError::Conflict(_)
                | AdminError::MissingIdentifier { .. }
                | AdminError::InvalidLfdi { .. }
                | AdminError::MissingExpiry { .. } => StatusCode::BAD_REQUEST,
            },
            Self::Metadata(e) => metadata_status(e),
            Self::Core(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        if status.is_server_error() {
            tracing::error!(code, status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::info!(code, status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            code: code.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(format!("invalid query: {}", rejection.body_text()))
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
