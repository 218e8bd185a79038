//! Named, storable grid layouts ("views").

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::messages::empty_list_as_default;
use crate::registry::ColumnRegistry;
use crate::state::{FilterSpec, Filters, SearchState, SortBy};
use crate::types::SortDirection;

/// Id prefix for layouts declared in code.
pub const PREDEFINED_LAYOUT_PREFIX: &str = "predefined";

/// Id prefix for layouts saved by users.
pub const CUSTOM_LAYOUT_PREFIX: &str = "custom";

/// Visibility and position override for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutColumn {
    /// Column value or raw value.
    pub value: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub order: usize,
}

/// A named preset of column visibility/order plus search, sort and filter state.
///
/// Absent `search`/`sort`/`filters` leave the request state untouched when the
/// layout is applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDefinition {
    #[serde(default)]
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub columns: Vec<LayoutColumn>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "empty_list_as_default"
    )]
    pub search: Option<SearchState>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "empty_list_as_default"
    )]
    pub sort: Option<SortBy>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "empty_list_as_default"
    )]
    pub filters: Option<Filters>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub default: bool,
}

impl LayoutDefinition {
    #[must_use]
    pub fn builder(label: impl Into<String>) -> LayoutBuilder {
        LayoutBuilder {
            layout: LayoutDefinition {
                label: label.into(),
                ..LayoutDefinition::default()
            },
        }
    }

    /// Override entry for a column identified by either of its keys.
    #[must_use]
    pub fn column_override(&self, value: &str, raw_value: &str) -> Option<&LayoutColumn> {
        self.columns
            .iter()
            .find(|c| c.value == value || c.value == raw_value)
    }
}

/// Fluent builder for code-declared layouts. Columns are ordered as added.
#[derive(Debug, Clone)]
pub struct LayoutBuilder {
    layout: LayoutDefinition,
}

impl LayoutBuilder {
    /// Adds a visible column at the next position.
    #[must_use]
    pub fn column(self, value: impl Into<String>) -> Self {
        self.push_column(value.into(), false)
    }

    /// Adds a column that keeps its slot but starts hidden.
    #[must_use]
    pub fn hidden_column(self, value: impl Into<String>) -> Self {
        self.push_column(value.into(), true)
    }

    fn push_column(mut self, value: String, hidden: bool) -> Self {
        let order = self.layout.columns.len();
        self.layout.columns.push(LayoutColumn {
            value,
            hidden,
            order,
        });
        self
    }

    #[must_use]
    pub fn search(mut self, search: SearchState) -> Self {
        self.layout.search = Some(search);
        self
    }

    #[must_use]
    pub fn sort(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.layout
            .sort
            .get_or_insert_with(SortBy::new)
            .insert(key.into(), direction);
        self
    }

    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, spec: FilterSpec) -> Self {
        self.layout
            .filters
            .get_or_insert_with(Filters::new)
            .insert(key.into(), spec);
        self
    }

    /// Flags this layout as the grid's default.
    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.layout.default = true;
        self
    }

    #[must_use]
    pub fn build(self) -> LayoutDefinition {
        self.layout
    }
}

/// Build-time checks for code-declared layouts.
///
/// # Errors
///
/// Fails when the list is empty, when more than one layout is flagged default,
/// or when a layout column names no registered column.
pub fn validate_layouts(
    layouts: &[LayoutDefinition],
    registry: &ColumnRegistry,
) -> Result<(), BuildError> {
    if layouts.is_empty() {
        return Err(BuildError::NoLayouts);
    }
    if layouts.iter().filter(|l| l.default).count() > 1 {
        return Err(BuildError::MultipleDefaultLayouts);
    }
    for layout in layouts {
        if let Some(missing) = layout
            .columns
            .iter()
            .find(|c| !registry.has_layout_key(&c.value))
        {
            return Err(BuildError::UnknownLayoutColumn {
                layout: layout.label.clone(),
                value: missing.value.clone(),
            });
        }
    }
    Ok(())
}
