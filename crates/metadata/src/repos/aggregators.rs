//! Aggregator repository.

use crate::error::MetadataResult;
use crate::models::AggregatorRow;
use async_trait::async_trait;
use gridkeep_core::Paging;

/// Read-only access to aggregator records.
#[async_trait]
pub trait AggregatorRepo: Send {
    /// Count every aggregator.
    async fn count_all_aggregators(&mut self) -> MetadataResult<u64>;

    /// Select a window of aggregators ordered by id ascending.
    async fn select_all_aggregators(&mut self, paging: Paging)
    -> MetadataResult<Vec<AggregatorRow>>;

    /// Get an aggregator by ID.
    async fn select_aggregator(&mut self, aggregator_id: i64)
    -> MetadataResult<Option<AggregatorRow>>;
}
