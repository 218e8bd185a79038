//! Per-request grid state: paging, search, sort and filters.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::messages::empty_list_as_default;
use crate::types::{SortDirection, Value};

/// Page size used when neither the request nor the session supplies one.
pub const DEFAULT_ITEMS_PER_PAGE: i64 = 50;

/// Ordered column-key to direction mapping. Insertion order is sort priority.
pub type SortBy = IndexMap<String, SortDirection>;

/// Column-key to filter mapping. Keys of icon columns carry an `_icon` suffix.
pub type Filters = IndexMap<String, FilterSpec>;

/// Search state echoed between client and server.
///
/// Only `queries` reaches the compiled query; `term` is a UI echo and is
/// cleared once the search stage has run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub recommendations: Vec<Value>,
    /// Column key to the terms searched in that column.
    #[serde(default, deserialize_with = "empty_list_as_default")]
    pub queries: IndexMap<String, Vec<String>>,
}

impl SearchState {
    #[must_use]
    pub fn has_queries(&self) -> bool {
        !self.queries.is_empty()
    }
}

/// One column filter as sent by the client: `{operator, value}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl FilterSpec {
    #[must_use]
    pub fn new(operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            operator: Some(operator.into()),
            value: value.into(),
        }
    }

    /// An empty spec (`{}` on the wire) carries no operator and is ignored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operator.as_deref().map_or(true, |op| op.trim().is_empty())
    }
}

/// Effective grid state for one request after normalization and layout application.
#[derive(Debug, Clone, PartialEq)]
pub struct GridState {
    pub page: i64,
    pub items_per_page: i64,
    pub search: SearchState,
    pub sort_by: SortBy,
    pub filters: Filters,
    pub current_layout: Option<String>,
}

impl Default for GridState {
    fn default() -> Self {
        Self {
            page: 1,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            search: SearchState::default(),
            sort_by: SortBy::new(),
            filters: Filters::new(),
            current_layout: None,
        }
    }
}

impl GridState {
    /// Returns `(offset, limit)` for the current page, or `None` when paging is
    /// disabled (`items_per_page <= 0`). Pages below 1 are treated as page 1.
    #[must_use]
    pub fn page_window(&self) -> Option<(u64, u64)> {
        let per_page = u64::try_from(self.items_per_page).ok().filter(|n| *n > 0)?;
        let page = u64::try_from(self.page.max(1)).unwrap_or(1);
        Some(((page - 1).saturating_mul(per_page), per_page))
    }

    /// `ceil(total_items / items_per_page)`. With paging disabled every item
    /// fits on a single page.
    #[must_use]
    pub fn total_pages(&self, total_items: u64) -> u64 {
        match u64::try_from(self.items_per_page).ok().filter(|n| *n > 0) {
            Some(per_page) => total_items.div_ceil(per_page),
            None => u64::from(total_items > 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_match_wire_defaults() {
        let state = GridState::default();
        assert_eq!(state.page, 1);
        assert_eq!(state.items_per_page, 50);
        assert_eq!(state.search.term, "");
        assert!(state.search.queries.is_empty());
        assert!(state.sort_by.is_empty());
        assert!(state.filters.is_empty());
    }

    #[test]
    fn page_window_for_third_page() {
        let state = GridState {
            page: 3,
            items_per_page: 25,
            ..GridState::default()
        };
        assert_eq!(state.page_window(), Some((50, 25)));
    }

    #[test]
    fn zero_items_per_page_disables_paging() {
        let state = GridState {
            page: 7,
            items_per_page: 0,
            ..GridState::default()
        };
        assert_eq!(state.page_window(), None);
        assert_eq!(state.total_pages(120), 1);
        assert_eq!(state.total_pages(0), 0);
    }

    #[test]
    fn empty_filter_spec_is_ignored() {
        let spec: FilterSpec = serde_json::from_value(json!({})).unwrap();
        assert!(spec.is_empty());
        assert!(!FilterSpec::new("=", "1").is_empty());
    }

    #[test]
    fn search_state_accepts_php_style_empty_queries() {
        let search: SearchState =
            serde_json::from_value(json!({"term": "x", "recommendations": [], "queries": []}))
                .unwrap();
        assert!(search.queries.is_empty());
        assert_eq!(search.term, "x");
    }

    #[test]
    fn search_queries_keep_insertion_order() {
        let search: SearchState =
            serde_json::from_str(r#"{"queries": {"zeta": ["a"], "alpha": ["b"]}}"#).unwrap();
        let keys: Vec<&str> = search.queries.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    proptest! {
        #[test]
        fn total_pages_is_ceiling_division(total in 0u64..100_000, per_page in 1i64..500) {
            let state = GridState { items_per_page: per_page, ..GridState::default() };
            let per_page = per_page as u64;
            let pages = state.total_pages(total);
            prop_assert!(pages * per_page >= total);
            prop_assert!(pages == 0 || (pages - 1) * per_page < total);
        }

        #[test]
        fn page_window_is_disabled_for_non_positive_sizes(page in -5i64..50, per_page in -10i64..=0) {
            let state = GridState { page, items_per_page: per_page, ..GridState::default() };
            prop_assert_eq!(state.page_window(), None);
        }
    }
}
