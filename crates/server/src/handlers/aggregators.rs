//! Aggregator endpoints: listing, lookup and certificate assignment.

use crate::error::{ApiError, ApiResult};
use crate::handlers::certificates::{CertificatePageResponse, CertificateResponse};
use crate::handlers::common::{PagingParams, finish, parse_id, read_json};
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use gridkeep_admin::aggregator::{fetch_many_aggregators, fetch_single_aggregator};
use gridkeep_admin::certificate::{
    add_many_certificates_for_aggregator, fetch_many_certificates_for_aggregator,
    unassign_certificate_for_aggregator,
};
use gridkeep_core::CertificateAssignmentRequest;
use gridkeep_metadata::models::AggregatorRow;
use serde::Serialize;
use time::OffsetDateTime;

/// Aggregator response.
#[derive(Debug, Serialize)]
pub struct AggregatorResponse {
    pub aggregator_id: i64,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub changed_time: OffsetDateTime,
}

impl From<AggregatorRow> for AggregatorResponse {
    fn from(row: AggregatorRow) -> Self {
        Self {
            aggregator_id: row.aggregator_id,
            name: row.name,
            created_time: row.created_time,
            changed_time: row.changed_time,
        }
    }
}

/// One page of aggregators.
#[derive(Debug, Serialize)]
pub struct AggregatorPageResponse {
    pub total_count: u64,
    pub limit: u64,
    pub start: u64,
    pub aggregators: Vec<AggregatorResponse>,
}

/// GET /v1/admin/aggregators - List aggregators.
pub async fn list_aggregators(
    State(state): State<AppState>,
    query: Result<Query<PagingParams>, QueryRejection>,
) -> ApiResult<Json<AggregatorPageResponse>> {
    let Query(params) = query?;
    let paging = params.resolve(&state.config.paging)?;

    let mut tx = state.begin().await?;
    let result = fetch_many_aggregators(tx.as_mut(), paging).await;
    let page = finish(tx, result).await?.map(AggregatorResponse::from);

    Ok(Json(AggregatorPageResponse {
        total_count: page.total_count,
        limit: page.limit,
        start: page.start,
        aggregators: page.items,
    }))
}

/// GET /v1/admin/aggregators/{aggregator_id} - Get one aggregator.
pub async fn get_aggregator(
    State(state): State<AppState>,
    Path(aggregator_id): Path<String>,
) -> ApiResult<Json<AggregatorResponse>> {
    let aggregator_id = parse_id(&aggregator_id, "aggregator")?;

    let mut tx = state.begin().await?;
    let result = fetch_single_aggregator(tx.as_mut(), aggregator_id).await;
    let aggregator = finish(tx, result)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("aggregator {aggregator_id} not found")))?;

    Ok(Json(aggregator.into()))
}

/// GET /v1/admin/aggregators/{aggregator_id}/certificates - List the
/// certificates assigned to an aggregator.
pub async fn list_aggregator_certificates(
    State(state): State<AppState>,
    Path(aggregator_id): Path<String>,
    query: Result<Query<PagingParams>, QueryRejection>,
) -> ApiResult<Json<CertificatePageResponse>> {
    let aggregator_id = parse_id(&aggregator_id, "aggregator")?;
    let Query(params) = query?;
    let paging = params.resolve(&state.config.paging)?;

    let mut tx = state.begin().await?;
    let result = fetch_many_certificates_for_aggregator(tx.as_mut(), aggregator_id, paging).await;
    let page = finish(tx, result)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("aggregator {aggregator_id} not found")))?
        .map(CertificateResponse::from);

    Ok(Json(CertificatePageResponse {
        total_count: page.total_count,
        limit: page.limit,
        start: page.start,
        certificates: page.items,
    }))
}

/// POST /v1/admin/aggregators/{aggregator_id}/certificates - Assign a batch
/// of certificates, creating unknown LFDIs. All or nothing.
pub async fn add_aggregator_certificates(
    State(state): State<AppState>,
    Path(aggregator_id): Path<String>,
    req: Request,
) -> ApiResult<StatusCode> {
    let aggregator_id = parse_id(&aggregator_id, "aggregator")?;
    let requests: Vec<CertificateAssignmentRequest> = read_json(req).await?;

    let mut tx = state.begin().await?;
    let result = add_many_certificates_for_aggregator(tx.as_mut(), aggregator_id, &requests).await;
    if let Err(e) = &result {
        metrics::record_batch_rejected(e.kind());
    }
    let summary = finish(tx, result).await?;

    metrics::CERTIFICATES_CREATED.inc_by(summary.certificates_created);
    metrics::ASSIGNMENTS_CREATED.inc_by(summary.assignments_created);

    Ok(StatusCode::CREATED)
}

/// DELETE /v1/admin/aggregators/{aggregator_id}/certificates/{certificate_id}
/// - Remove one assignment. The certificate itself is kept.
pub async fn unassign_aggregator_certificate(
    State(state): State<AppState>,
    Path((aggregator_id, certificate_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let aggregator_id = parse_id(&aggregator_id, "aggregator")?;
    let certificate_id = parse_id(&certificate_id, "certificate")?;

    let mut tx = state.begin().await?;
    let result =
        unassign_certificate_for_aggregator(tx.as_mut(), aggregator_id, certificate_id).await;
    finish(tx, result).await?;

    metrics::ASSIGNMENTS_REMOVED.inc();

    Ok(StatusCode::NO_CONTENT)
}
