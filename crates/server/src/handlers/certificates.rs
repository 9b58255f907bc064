//! Certificate catalogue endpoints.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{PagingParams, finish, parse_id, read_json};
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use gridkeep_admin::certificate::{add_certificate, fetch_many_certificates, fetch_single_certificate};
use gridkeep_core::Lfdi;
use gridkeep_metadata::models::CertificateRow;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Certificate response.
#[derive(Debug, Serialize)]
pub struct CertificateResponse {
    pub certificate_id: i64,
    pub lfdi: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expiry: OffsetDateTime,
}

impl From<CertificateRow> for CertificateResponse {
    fn from(row: CertificateRow) -> Self {
        Self {
            certificate_id: row.certificate_id,
            lfdi: row.lfdi,
            created: row.created,
            expiry: row.expiry,
        }
    }
}

/// One page of certificates.
#[derive(Debug, Serialize)]
pub struct CertificatePageResponse {
    pub total_count: u64,
    pub limit: u64,
    pub start: u64,
    pub certificates: Vec<CertificateResponse>,
}

/// Create certificate request.
#[derive(Debug, Deserialize)]
pub struct CreateCertificateRequest {
    pub lfdi: Lfdi,
    #[serde(with = "time::serde::rfc3339")]
    pub expiry: OffsetDateTime,
}

/// GET /v1/admin/certificates - List all certificates.
pub async fn list_certificates(
    State(state): State<AppState>,
    query: Result<Query<PagingParams>, QueryRejection>,
) -> ApiResult<Json<CertificatePageResponse>> {
    let Query(params) = query?;
    let paging = params.resolve(&state.config.paging)?;

    let mut tx = state.begin().await?;
    let result = fetch_many_certificates(tx.as_mut(), paging).await;
    let page = finish(tx, result).await?.map(CertificateResponse::from);

    Ok(Json(CertificatePageResponse {
        total_count: page.total_count,
        limit: page.limit,
        start: page.start,
        certificates: page.items,
    }))
}

/// GET /v1/admin/certificates/{certificate_id} - Get one certificate.
pub async fn get_certificate(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
) -> ApiResult<Json<CertificateResponse>> {
    let certificate_id = parse_id(&certificate_id, "certificate")?;

    let mut tx = state.begin().await?;
    let result = fetch_single_certificate(tx.as_mut(), certificate_id).await;
    let certificate = finish(tx, result)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("certificate {certificate_id} not found")))?;

    Ok(Json(certificate.into()))
}

/// POST /v1/admin/certificates - Register a certificate.
pub async fn create_certificate(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<CertificateResponse>)> {
    let body: CreateCertificateRequest = read_json(req).await?;

    let mut tx = state.begin().await?;
    let result = add_certificate(tx.as_mut(), body.lfdi, body.expiry).await;
    let certificate = finish(tx, result).await?;

    metrics::CERTIFICATES_CREATED.inc();

    Ok((StatusCode::CREATED, Json(certificate.into())))
}
