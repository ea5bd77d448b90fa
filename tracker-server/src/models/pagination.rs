//! `?page=&per_page=` handling for list endpoints

use serde::{Deserialize, Serialize};

const MAX_PER_PAGE: u32 = 100;
const DEFAULT_PER_PAGE: u32 = 20;

/// Raw query parameters, before clamping.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// A validated page window. `page` is 1-based, `per_page` is 1..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// SQL `OFFSET`. Widened before multiplying so any `u32` page is safe.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.per_page)
    }

    /// SQL `LIMIT`.
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

impl From<PaginationParams> for Pagination {
    fn from(params: PaginationParams) -> Self {
        Self::new(
            params.page.unwrap_or(1),
            params.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
    }
}

/// One page of a list response, with enough metadata for a pager UI.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: i64,
    pub has_more: bool,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, window: Pagination) -> Self {
        let total = total.max(0);
        let per_page = i64::from(window.per_page);
        let total_pages = ((total + per_page - 1) / per_page).max(1);
        Self {
            items,
            total,
            page: window.page,
            per_page: window.per_page,
            total_pages,
            has_more: i64::from(window.page) < total_pages,
        }
    }

    /// Convert items, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
            has_more: self.has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_clamped() {
        assert_eq!(Pagination::new(0, 0), Pagination { page: 1, per_page: 1 });
        assert_eq!(Pagination::new(3, 999).per_page, 100);
        assert_eq!(Pagination::default().per_page, 20);
    }

    #[test]
    fn offset_counts_whole_pages() {
        assert_eq!(Pagination::new(1, 10).offset(), 0);
        assert_eq!(Pagination::new(3, 25).offset(), 50);
    }

    #[test]
    fn huge_page_number_does_not_overflow() {
        let window = Pagination::from(PaginationParams {
            page: Some(50_000_000),
            per_page: Some(100),
        });
        assert_eq!(window.offset(), 4_999_999_900);

        let window = Pagination::new(u32::MAX, 100);
        assert_eq!(window.offset(), (i64::from(u32::MAX) - 1) * 100);
    }

    #[test]
    fn page_metadata() {
        let window = Pagination::new(2, 10);
        let page = Paginated::new(vec![(); 10], 25, window);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_more);

        let last = Paginated::<()>::new(vec![], 25, Pagination::new(3, 10));
        assert!(!last.has_more);

        let empty = Paginated::<()>::new(vec![], 0, Pagination::default());
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_more);
    }

    #[test]
    fn totals_beyond_u32_are_kept() {
        let page = Paginated::<()>::new(vec![], 10_000_000_000, Pagination::new(1, 100));
        assert_eq!(page.total_pages, 100_000_000);
    }

    #[test]
    fn map_keeps_metadata() {
        let page = Paginated::new(vec![1, 2, 3], 13, Pagination::new(2, 3));
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20, 30]);
        assert_eq!(mapped.total, 13);
        assert_eq!(mapped.total_pages, 5);
        assert!(mapped.has_more);
    }

    #[test]
    fn serializes_pager_fields() {
        let json = serde_json::to_value(Paginated::new(vec!["a"], 1, Pagination::default())).unwrap();
        assert_eq!(json["total_pages"], 1);
        assert_eq!(json["has_more"], false);
    }
}
