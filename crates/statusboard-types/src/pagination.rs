//! Offset/limit paging parameters for list reads.

use serde::{Deserialize, Serialize};

/// Raw paging parameters as supplied by a caller.
///
/// Values are normalised on use rather than rejected: a non-positive
/// `limit` becomes [`Pagination::DEFAULT_LIMIT`], anything above
/// [`Pagination::MAX_LIMIT`] is clamped, a negative `offset` becomes zero,
/// and a positive `page` overrides `offset` entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Page size requested.
    #[serde(default)]
    pub limit: i64,
    /// Number of matching records to skip.
    #[serde(default)]
    pub offset: i64,
    /// Zero-based page number; wins over `offset` when positive.
    #[serde(default)]
    pub page: i64,
}

impl Pagination {
    /// Page size used when none (or a non-positive one) is given.
    pub const DEFAULT_LIMIT: i64 = 25;
    /// Largest page size ever returned.
    pub const MAX_LIMIT: i64 = 50;

    /// Builds parameters with only a limit set.
    pub fn with_limit(limit: i64) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Builds parameters for a zero-based page of the default size.
    pub fn page(page: i64) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    /// The page size actually applied, in `1..=MAX_LIMIT`.
    pub fn effective_limit(&self) -> usize {
        let limit = if self.limit <= 0 {
            Self::DEFAULT_LIMIT
        } else {
            self.limit.min(Self::MAX_LIMIT)
        };
        limit as usize
    }

    /// The number of matching records skipped before collecting results.
    pub fn effective_offset(&self) -> usize {
        if self.page > 0 {
            return (self.page as usize).saturating_mul(self.effective_limit());
        }
        self.offset.max(0) as usize
    }
}
