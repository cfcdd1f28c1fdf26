//! Offset-based pagination for list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size when `limit` is not specified.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Query parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl PageParams {
    /// Resolve effective page size, clamped to [1, MAX_PAGE_SIZE].
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn effective_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    pub fn meta(&self, returned: usize, total: u64) -> PageMeta {
        let offset = self.effective_offset();
        let next = offset + returned;
        PageMeta {
            limit: self.effective_limit(),
            offset,
            next_offset: (returned > 0 && (next as u64) < total).then_some(next),
        }
    }
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub limit: usize,
    pub offset: usize,
    /// Offset of the next page, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        let params = PageParams {
            limit: Some(0),
            offset: None,
        };
        assert_eq!(params.effective_limit(), 1);
        let params = PageParams {
            limit: Some(50_000),
            offset: None,
        };
        assert_eq!(params.effective_limit(), MAX_PAGE_SIZE);
        assert_eq!(PageParams::default().effective_limit(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn next_offset_only_when_more_remain() {
        let params = PageParams {
            limit: Some(2),
            offset: Some(2),
        };
        assert_eq!(params.meta(2, 5).next_offset, Some(4));
        assert_eq!(params.meta(2, 4).next_offset, None);
        assert_eq!(params.meta(0, 5).next_offset, None);
    }
}
