//! Applies the active layout to grid state and column visibility.

use gridshape_core::layout::PREDEFINED_LAYOUT_PREFIX;
use gridshape_core::{ColumnRegistry, GridState, LayoutDefinition};

/// Assigns `predefined_<i>` ids to code-declared layouts and marks the one
/// matching `current`.
pub(crate) fn identify_predefined(
    layouts: Vec<LayoutDefinition>,
    current: Option<&str>,
) -> Vec<LayoutDefinition> {
    layouts
        .into_iter()
        .enumerate()
        .map(|(i, mut layout)| {
            layout.id = format!("{PREDEFINED_LAYOUT_PREFIX}_{i}");
            layout.current = current == Some(layout.id.as_str());
            layout.custom = false;
            layout
        })
        .collect()
}

/// Clears the `current` flag on every layout.
pub(crate) fn clear_current(layouts: &mut [LayoutDefinition]) {
    for layout in layouts {
        layout.current = false;
    }
}

/// Finds `id` among predefined layouts first, then saved custom ones.
pub(crate) fn find_layout<'a>(
    id: &str,
    predefined: &'a [LayoutDefinition],
    custom: &'a [LayoutDefinition],
) -> Option<&'a LayoutDefinition> {
    predefined.iter().chain(custom).find(|l| l.id == id)
}

/// Overlays `layout` onto `state` and the registry's column display state.
///
/// Search, sort and filters are replaced wholesale when the layout defines
/// them. Columns the layout lists take its `hidden`/`order`; every other
/// column is hidden.
pub(crate) fn apply_layout(
    layout: &LayoutDefinition,
    state: &mut GridState,
    registry: &mut ColumnRegistry,
) {
    if let Some(search) = &layout.search {
        state.search = search.clone();
    }
    if let Some(sort) = &layout.sort {
        state.sort_by = sort.clone();
    }
    if let Some(filters) = &layout.filters {
        state.filters = filters.clone();
    }
    for column in registry.iter_mut() {
        match layout.column_override(&column.value, &column.raw_value) {
            Some(entry) => {
                column.hidden = entry.hidden;
                column.index = entry.order;
            }
            None => column.hidden = true,
        }
    }
}
