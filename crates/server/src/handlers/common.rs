//! Shared handler helpers.

use crate::error::{ApiError, ApiResult};
use axum::extract::Request;
use gridkeep_admin::AdminResult;
use gridkeep_core::Paging;
use gridkeep_core::config::PagingConfig;
use gridkeep_metadata::MetadataTx;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Maximum request body size for admin endpoints (1 MiB).
const MAX_ADMIN_BODY_SIZE: usize = 1024 * 1024;

/// Query parameters for paged listings.
#[derive(Debug, Default, Deserialize)]
pub struct PagingParams {
    /// Number of records to skip (default: 0).
    pub start: Option<i64>,
    /// Maximum number of records to return (default and cap from config).
    pub limit: Option<i64>,
}

impl PagingParams {
    /// Validate the parameters and apply configured defaults and caps.
    pub fn resolve(&self, config: &PagingConfig) -> ApiResult<Paging> {
        Ok(Paging::from_params(
            self.start,
            self.limit,
            config.default_limit,
            config.max_limit,
        )?)
    }
}

/// Parse a numeric path segment.
pub fn parse_id(raw: &str, what: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|e| ApiError::BadRequest(format!("invalid {what} ID '{raw}': {e}")))
}

/// Read and deserialize a JSON request body.
pub async fn read_json<T: DeserializeOwned>(req: Request) -> ApiResult<T> {
    let bytes = axum::body::to_bytes(req.into_body(), MAX_ADMIN_BODY_SIZE)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))
}

/// Close a transaction according to the outcome of the work done in it.
///
/// Success commits; failure rolls back and returns the original error. A
/// failed rollback is only logged since the connection discards the
/// transaction on release anyway.
pub async fn finish<T>(tx: Box<dyn MetadataTx>, result: AdminResult<T>) -> ApiResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "Failed to roll back transaction");
            }
            Err(err.into())
        }
    }
}
