//! Paged listing results.

use gridkeep_core::Paging;
use gridkeep_metadata::models::{AggregatorRow, CertificateRow};

/// One window of an id-ordered listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Number of records in the whole listing, not just this window.
    pub total_count: u64,
    pub start: u64,
    pub limit: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(paging: Paging, total_count: u64, items: Vec<T>) -> Self {
        Self {
            total_count,
            start: paging.start,
            limit: paging.limit,
            items,
        }
    }

    /// Convert every item, keeping the window metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total_count: self.total_count,
            start: self.start,
            limit: self.limit,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

pub type AggregatorPage = Page<AggregatorRow>;
pub type CertificatePage = Page<CertificateRow>;
