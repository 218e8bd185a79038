//! Assembles the metadata block returned alongside each page of rows.

use gridshape_core::registry::FILTER_RESOLUTION_ORDER;
use gridshape_core::{
    ColumnDefinition, ColumnRegistry, GridState, LayoutDefinition, MetaData, StateSources,
};

use super::compiler::ICON_SUFFIX;

pub(crate) struct MetaInputs<'a> {
    pub table_ref: &'a str,
    pub state: &'a GridState,
    pub registry: &'a ColumnRegistry,
    pub layouts: Vec<LayoutDefinition>,
    pub current_layout: Option<String>,
    pub total_items: u64,
    pub hyperlinks: bool,
    pub states: StateSources,
}

/// Builds [`MetaData`] for the page. Columns come back in display order and
/// any column the user is filtering or searching on is shown.
pub(crate) fn assemble(inputs: MetaInputs<'_>) -> MetaData {
    let MetaInputs {
        table_ref,
        state,
        registry,
        layouts,
        current_layout,
        total_items,
        hyperlinks,
        states,
    } = inputs;

    let filtered = state.filters.keys().filter_map(|key| {
        let key = key.strip_suffix(ICON_SUFFIX).unwrap_or(key);
        registry.resolve_with(key, &FILTER_RESOLUTION_ORDER)
    });
    let searched = state.search.queries.keys().filter_map(|key| registry.resolve(key));
    let active: Vec<usize> = filtered.chain(searched).map(|hit| hit.position).collect();

    let mut columns: Vec<ColumnDefinition> = registry.columns().to_vec();
    for position in active {
        columns[position].hidden = false;
    }
    columns.sort_by_key(|c| c.index);

    MetaData {
        table_ref: table_ref.to_string(),
        page: state.page,
        items_per_page: state.items_per_page,
        total_items,
        total_pages: state.total_pages(total_items),
        sort_by: state.sort_by.clone(),
        filters: state.filters.clone(),
        search: state.search.clone(),
        columns,
        layouts,
        current_layout,
        hyperlinks,
        advanced_column_types: MetaData::advanced_types(),
        states,
    }
}

#[cfg(test)]
mod tests {
    use gridshape_core::{ColumnType, FilterSpec};

    use super::*;

    fn registry() -> ColumnRegistry {
        let mut registry = ColumnRegistry::new();
        for (value, raw) in [("name", "u.name"), ("status", "u.status"), ("city", "a.city")] {
            registry
                .push(
                    ColumnDefinition::builder(value, raw)
                        .kind(ColumnType::Plain)
                        .hidden(true)
                        .build(),
                )
                .unwrap();
        }
        registry
            .push(
                ColumnDefinition::builder("health", "h.score")
                    .kind(ColumnType::Icon)
                    .icon_condition("health_state", "h.state")
                    .hidden(true)
                    .build(),
            )
            .unwrap();
        registry
    }

    fn inputs<'a>(state: &'a GridState, registry: &'a ColumnRegistry) -> MetaInputs<'a> {
        MetaInputs {
            table_ref: "admin/users",
            state,
            registry,
            layouts: Vec::new(),
            current_layout: None,
            total_items: 101,
            hyperlinks: true,
            states: StateSources::default(),
        }
    }

    #[test]
    fn filtered_and_searched_columns_are_shown() {
        let registry = registry();
        let mut state = GridState::default();
        state
            .filters
            .insert("u.status".to_string(), FilterSpec::new("=", "1"));
        state
            .filters
            .insert("health_state_icon".to_string(), FilterSpec::new("=", "ok"));
        state
            .search
            .queries
            .insert("city".to_string(), vec!["par".to_string()]);
        let meta = assemble(inputs(&state, &registry));
        let hidden: Vec<(&str, bool)> = meta
            .columns
            .iter()
            .map(|c| (c.value.as_str(), c.hidden))
            .collect();
        assert_eq!(
            hidden,
            vec![("name", true), ("status", false), ("city", false), ("health", false)]
        );
    }

    #[test]
    fn paging_totals_and_flags() {
        let registry = registry();
        let state = GridState {
            items_per_page: 25,
            ..GridState::default()
        };
        let meta = assemble(inputs(&state, &registry));
        assert_eq!(meta.table_ref, "admin/users");
        assert_eq!(meta.total_items, 101);
        assert_eq!(meta.total_pages, 5);
        assert!(meta.hyperlinks);
        assert_eq!(meta.advanced_column_types.len(), 5);
    }

    #[test]
    fn columns_follow_display_index() {
        let mut registry = registry();
        for column in registry.iter_mut() {
            column.index = 3 - column.index;
        }
        let meta = assemble(inputs(&GridState::default(), &registry));
        let order: Vec<&str> = meta.columns.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(order, vec!["health", "city", "status", "name"]);
    }
}
