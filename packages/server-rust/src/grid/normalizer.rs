//! Reads paging, search, sort and filter state from the configured sources.

use gridshape_core::plan::OrderBy;
use gridshape_core::{
    ConfigRecord, GridRequest, GridState, SessionState, SortBy, StateSource, StateSources,
};

/// Everything state normalization reads from.
pub(crate) struct StateInputs<'a> {
    pub request: &'a GridRequest,
    pub session: Option<&'a SessionState>,
    pub record: &'a ConfigRecord,
    pub sources: StateSources,
    pub default_items_per_page: i64,
}

impl StateInputs<'_> {
    /// The request-shaped source for a category. Configuration only backs
    /// filters and is handled separately.
    fn source(&self, source: StateSource) -> Option<&GridRequest> {
        match source {
            StateSource::Route => Some(self.request),
            StateSource::Session => self.session,
            StateSource::Config => None,
        }
    }
}

/// Builds the effective state before any layout is applied.
pub(crate) fn normalize(inputs: &StateInputs<'_>) -> GridState {
    let paging = inputs.source(inputs.sources.page);
    let search = inputs
        .source(inputs.sources.search)
        .and_then(|r| r.search.clone());
    let sort_by = inputs
        .source(inputs.sources.sort)
        .and_then(|r| r.sort_by.clone());
    let filters = match inputs.sources.filter {
        StateSource::Config => Some(inputs.record.filters.clone()),
        other => inputs.source(other).and_then(|r| r.filters.clone()),
    };

    GridState {
        page: paging.and_then(|r| r.page).unwrap_or(1),
        items_per_page: paging
            .and_then(|r| r.items_per_page)
            .unwrap_or(inputs.default_items_per_page),
        search: search.unwrap_or_default(),
        sort_by: sort_by.unwrap_or_default(),
        filters: filters.unwrap_or_default(),
        current_layout: inputs.record.current_layout.clone(),
    }
}

/// Fills in sort order when the request supplied none: the base query's own
/// orders if no default was declared, otherwise the declared default.
pub(crate) fn adopt_sort(
    state: &mut GridState,
    request: &GridRequest,
    base_orders: Vec<OrderBy>,
    default_order: &SortBy,
) {
    if request.has_user_sort() {
        return;
    }
    if !base_orders.is_empty() && default_order.is_empty() {
        for order in base_orders {
            state.sort_by.insert(order.expression, order.direction);
        }
    } else {
        for (column, direction) in default_order {
            state.sort_by.insert(column.clone(), *direction);
        }
    }
}

#[cfg(test)]
mod tests {
    use gridshape_core::{FilterSpec, Filters, SearchState, SortDirection};

    use super::*;

    fn inputs<'a>(
        request: &'a GridRequest,
        session: Option<&'a SessionState>,
        record: &'a ConfigRecord,
        sources: StateSources,
    ) -> StateInputs<'a> {
        StateInputs {
            request,
            session,
            record,
            sources,
            default_items_per_page: 50,
        }
    }

    fn sort(pairs: &[(&str, SortDirection)]) -> SortBy {
        pairs.iter().map(|(k, d)| ((*k).to_string(), *d)).collect()
    }

    #[test]
    fn empty_request_yields_defaults() {
        let request = GridRequest::default();
        let record = ConfigRecord::new("users");
        let state = normalize(&inputs(&request, None, &record, StateSources::default()));
        assert_eq!(state, GridState::default());
    }

    #[test]
    fn route_sources_read_request() {
        let request = GridRequest {
            page: Some(3),
            items_per_page: Some(10),
            search: Some(SearchState {
                term: "x".to_string(),
                ..SearchState::default()
            }),
            sort_by: Some(sort(&[("name", SortDirection::Desc)])),
            filters: Some(Filters::from([("status".to_string(), FilterSpec::new("=", "1"))])),
            ..GridRequest::default()
        };
        let record = ConfigRecord::new("users");
        let state = normalize(&inputs(&request, None, &record, StateSources::default()));
        assert_eq!((state.page, state.items_per_page), (3, 10));
        assert_eq!(state.search.term, "x");
        assert_eq!(state.sort_by["name"], SortDirection::Desc);
        assert_eq!(state.filters.len(), 1);
    }

    #[test]
    fn session_and_config_sources_ignore_request() {
        let request = GridRequest {
            page: Some(9),
            filters: Some(Filters::from([("a".to_string(), FilterSpec::new("=", "1"))])),
            ..GridRequest::default()
        };
        let session = SessionState {
            page: Some(2),
            ..SessionState::default()
        };
        let mut record = ConfigRecord::new("users");
        record
            .filters
            .insert("b".to_string(), FilterSpec::new("!=", "2"));
        record.current_layout = Some("predefined_0".to_string());
        let sources = StateSources {
            filter: StateSource::Config,
            page: StateSource::Session,
            ..StateSources::default()
        };
        let state = normalize(&inputs(&request, Some(&session), &record, sources));
        assert_eq!(state.page, 2);
        assert_eq!(state.items_per_page, 50);
        assert!(state.filters.contains_key("b"));
        assert!(!state.filters.contains_key("a"));
        assert_eq!(state.current_layout.as_deref(), Some("predefined_0"));
    }

    #[test]
    fn missing_session_falls_back_to_defaults() {
        let request = GridRequest {
            page: Some(4),
            ..GridRequest::default()
        };
        let record = ConfigRecord::new("users");
        let sources = StateSources {
            page: StateSource::Session,
            ..StateSources::default()
        };
        let state = normalize(&inputs(&request, None, &record, sources));
        assert_eq!(state.page, 1);
    }

    #[test]
    fn base_orders_adopted_without_default() {
        let mut state = GridState::default();
        let orders = vec![OrderBy {
            expression: "u.created_at".to_string(),
            direction: SortDirection::Desc,
        }];
        adopt_sort(&mut state, &GridRequest::default(), orders, &SortBy::new());
        assert_eq!(state.sort_by["u.created_at"], SortDirection::Desc);
    }

    #[test]
    fn default_order_beats_base_orders() {
        let mut state = GridState::default();
        let orders = vec![OrderBy {
            expression: "u.created_at".to_string(),
            direction: SortDirection::Desc,
        }];
        let default = sort(&[("name", SortDirection::Asc)]);
        adopt_sort(&mut state, &GridRequest::default(), orders, &default);
        assert_eq!(state.sort_by, default);
    }

    #[test]
    fn user_sort_suppresses_adoption() {
        let request = GridRequest {
            sort_by: Some(sort(&[("email", SortDirection::Asc)])),
            ..GridRequest::default()
        };
        let mut state = GridState {
            sort_by: sort(&[("email", SortDirection::Asc)]),
            ..GridState::default()
        };
        adopt_sort(
            &mut state,
            &request,
            Vec::new(),
            &sort(&[("name", SortDirection::Desc)]),
        );
        assert_eq!(state.sort_by.len(), 1);
        assert!(state.sort_by.contains_key("email"));
    }
}
