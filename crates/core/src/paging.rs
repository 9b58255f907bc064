//! Paging windows for listing endpoints.

use serde::{Deserialize, Serialize};

/// A `[start, start + limit)` window over an id-ordered listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub start: u64,
    pub limit: u64,
}

impl Paging {
    /// Create a window without any validation.
    pub fn new(start: u64, limit: u64) -> Self {
        Self { start, limit }
    }

    /// Build a window from raw query parameters.
    ///
    /// Missing values fall back to `start = 0` and `default_limit`. Negative
    /// values are rejected; limits above `max_limit` are clamped.
    pub fn from_params(
        start: Option<i64>,
        limit: Option<i64>,
        default_limit: u64,
        max_limit: u64,
    ) -> crate::Result<Self> {
        let start = match start {
            None => 0,
            Some(s) => u64::try_from(s).map_err(|_| {
                crate::Error::InvalidPaging(format!("start must be non-negative, got {s}"))
            })?,
        };
        let limit = match limit {
            None => default_limit,
            Some(l) => u64::try_from(l).map_err(|_| {
                crate::Error::InvalidPaging(format!("limit must be non-negative, got {l}"))
            })?,
        };
        Ok(Self {
            start,
            limit: limit.min(max_limit),
        })
    }

    /// Offset as a signed SQL parameter, saturating at `i64::MAX`.
    pub fn sql_offset(&self) -> i64 {
        i64::try_from(self.start).unwrap_or(i64::MAX)
    }

    /// Limit as a signed SQL parameter, saturating at `i64::MAX`.
    pub fn sql_limit(&self) -> i64 {
        i64::try_from(self.limit).unwrap_or(i64::MAX)
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            start: 0,
            limit: crate::DEFAULT_PAGE_LIMIT,
        }
    }
}
