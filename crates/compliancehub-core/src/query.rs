//! List query building.
//!
//! List endpoints accept the same family of query parameters: page-number
//! pagination, a free-text `search`, an `ordering` field, and per-resource
//! filters (`framework`, `status`, `verification_status`, ...). `ListQuery`
//! collects them and renders a deterministic, key-sorted parameter list so
//! that identical queries produce identical cache keys.

use std::collections::BTreeMap;

/// Query parameters for a list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    page: Option<u32>,
    page_size: Option<u32>,
    search: Option<String>,
    ordering: Option<String>,
    filters: BTreeMap<String, String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a specific page (1-based).
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Free-text search. Blank strings are dropped.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() { None } else { Some(term) };
        self
    }

    /// Ordering field, e.g. `-created_at`.
    pub fn ordering(mut self, field: impl Into<String>) -> Self {
        self.ordering = Some(field.into());
        self
    }

    /// Add a filter. A later value for the same key replaces the earlier one.
    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.filters.insert(key.into(), value.to_string());
        self
    }

    /// Add a filter only when a value is present.
    pub fn filter_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.filter(key, v),
            None => self,
        }
    }

    /// The requested page, defaulting to the first.
    pub fn current_page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// True when no parameter would be sent.
    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }

    /// Render as key-sorted `(key, value)` pairs.
    ///
    /// The dedicated setters win over a filter with the same key. Empty
    /// filter values are omitted.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut params: BTreeMap<String, String> = self
            .filters
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if let Some(page) = self.page {
            params.insert("page".to_string(), page.to_string());
        }
        if let Some(size) = self.page_size {
            params.insert("page_size".to_string(), size.to_string());
        }
        if let Some(search) = &self.search {
            params.insert("search".to_string(), search.clone());
        }
        if let Some(ordering) = &self.ordering {
            params.insert("ordering".to_string(), ordering.clone());
        }

        params.into_iter().collect()
    }

    /// Render as a `k=v&k=v` string. Used for cache keys and logs, not for
    /// building URLs.
    pub fn render(&self) -> String {
        self.pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}
