//! Page-number pagination envelope.

use serde::{Deserialize, Serialize};

/// Page size the API uses when the request does not set one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    /// Total number of items across all pages
    pub count: u64,

    /// Absolute URL of the next page, if any
    #[serde(default)]
    pub next: Option<String>,

    /// Absolute URL of the previous page, if any
    #[serde(default)]
    pub previous: Option<String>,

    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Whether the server reports another page after this one.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Number of pages needed to hold `count` items at `page_size`.
    pub fn total_pages(&self, page_size: u32) -> u64 {
        if page_size == 0 {
            return 0;
        }
        self.count.div_ceil(u64::from(page_size))
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_parses_drf_envelope() {
        let body = serde_json::json!({
            "count": 120,
            "next": "http://localhost:8000/api/evidence/evidence/?page=2",
            "previous": null,
            "results": [1, 2, 3]
        });

        let page: Page<u32> = serde_json::from_value(body).unwrap();
        assert!(page.has_next());
        assert_eq!(page.results, vec![1, 2, 3]);
        assert_eq!(page.total_pages(DEFAULT_PAGE_SIZE), 3);
    }

    #[test]
    fn test_last_page_has_no_next() {
        let page: Page<u32> =
            serde_json::from_str(r#"{"count": 1, "next": null, "previous": null, "results": [7]}"#)
                .unwrap();
        assert!(!page.has_next());
    }
}
