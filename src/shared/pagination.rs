//! Pagination query parameters and response envelope.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_NUMBER: i64 = 1_000_000;

/// `?page_number=&page_size=` query parameters. Out-of-range values are
/// clamped rather than rejected.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page_number", alias = "page")]
    pub page_number: i64,
    #[serde(default = "default_page_size", alias = "pageSize")]
    pub page_size: i64,
}

fn default_page_number() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationQuery {
    pub fn new(page_number: i64, page_size: i64) -> Self {
        Self {
            page_number,
            page_size,
        }
        .normalized()
    }

    pub fn normalized(self) -> Self {
        Self {
            page_number: self.page_number.clamp(1, MAX_PAGE_NUMBER),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// SQL `LIMIT`
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// SQL `OFFSET`
    pub fn offset(&self) -> i64 {
        self.page_number
            .saturating_sub(1)
            .max(0)
            .saturating_mul(self.page_size)
    }
}

/// Paged list envelope returned by list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page_number: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total_count: i64, page: PaginationQuery) -> Self {
        let total_pages = if total_count == 0 {
            0
        } else {
            (total_count + page.page_size - 1) / page.page_size
        };

        Self {
            items,
            total_count,
            page_number: page.page_number,
            page_size: page.page_size,
            total_pages,
            has_previous_page: page.page_number > 1,
            has_next_page: page.page_number < total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_number: self.page_number,
            page_size: self.page_size,
            total_pages: self.total_pages,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 10, 1, 10 ; "page zero becomes first page")]
    #[test_case(-3, 10, 1, 10 ; "negative page becomes first page")]
    #[test_case(2, 0, 2, 1 ; "page size floor")]
    #[test_case(1, 500, 1, 100 ; "page size ceiling")]
    #[test_case(i64::MAX, 10, MAX_PAGE_NUMBER, 10 ; "page number ceiling")]
    fn test_normalization(page: i64, size: i64, expected_page: i64, expected_size: i64) {
        let q = PaginationQuery::new(page, size);
        assert_eq!(q.page_number, expected_page);
        assert_eq!(q.page_size, expected_size);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PaginationQuery::new(3, 20).offset(), 40);
        assert_eq!(PaginationQuery::default().offset(), 0);
    }

    #[test]
    fn test_huge_page_number_from_query_does_not_overflow() {
        let q: PaginationQuery = serde_json::from_value(serde_json::json!({
            "page_number": i64::MAX,
            "page_size": MAX_PAGE_SIZE,
        }))
        .unwrap();

        assert_eq!(q.normalized().offset(), (MAX_PAGE_NUMBER - 1) * MAX_PAGE_SIZE);
        assert_eq!(q.offset(), i64::MAX);
    }

    #[test]
    fn test_envelope_page_math() {
        let page = PaginationQuery::new(2, 10);
        let response = PaginatedResponse::new(vec![1, 2, 3], 23, page);

        assert_eq!(response.total_pages, 3);
        assert!(response.has_previous_page);
        assert!(response.has_next_page);
    }

    #[test]
    fn test_empty_envelope() {
        let response = PaginatedResponse::<i32>::new(vec![], 0, PaginationQuery::default());
        assert_eq!(response.total_pages, 0);
        assert!(!response.has_previous_page);
        assert!(!response.has_next_page);
    }

    #[test]
    fn test_query_defaults_from_empty_string() {
        let q: PaginationQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page_number, 1);
        assert_eq!(q.page_size, DEFAULT_PAGE_SIZE);
    }
}
