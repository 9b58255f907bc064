//! Aggregator manager.

use crate::error::AdminResult;
use crate::page::AggregatorPage;
use gridkeep_core::Paging;
use gridkeep_metadata::MetadataTx;
use gridkeep_metadata::models::AggregatorRow;
use gridkeep_metadata::repos::AggregatorRepo;

/// List a window of aggregators ordered by id, with the overall count.
pub async fn fetch_many_aggregators(
    tx: &mut dyn MetadataTx,
    paging: Paging,
) -> AdminResult<AggregatorPage> {
    let total_count = tx.count_all_aggregators().await?;
    let aggregators = tx.select_all_aggregators(paging).await?;
    Ok(AggregatorPage::new(paging, total_count, aggregators))
}

/// Look up one aggregator. `None` when no aggregator has that id.
pub async fn fetch_single_aggregator(
    tx: &mut dyn MetadataTx,
    aggregator_id: i64,
) -> AdminResult<Option<AggregatorRow>> {
    Ok(tx.select_aggregator(aggregator_id).await?)
}
