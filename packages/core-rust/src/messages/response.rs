//! Outbound grid response: the decorated rows for one page plus the metadata a
//! client renderer needs to draw the grid and echo state back.

use serde::{Deserialize, Serialize};

use crate::column::{ColumnDefinition, ColumnType, ADVANCED_COLUMN_TYPES};
use crate::layout::LayoutDefinition;
use crate::state::{Filters, SearchState, SortBy};
use crate::types::Row;

/// Where a category of grid state was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateSource {
    /// Persisted grid configuration.
    Config,
    /// Session store keyed by grid reference.
    Session,
    /// Request parameters.
    #[default]
    Route,
}

/// State source per category, echoed so the client knows where to write back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateSources {
    pub filter: StateSource,
    pub search: StateSource,
    pub sort: StateSource,
    pub page: StateSource,
}

/// Grid metadata accompanying each page of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub table_ref: String,
    pub page: i64,
    pub items_per_page: i64,
    pub total_items: u64,
    pub total_pages: u64,
    pub sort_by: SortBy,
    pub filters: Filters,
    pub search: SearchState,
    pub columns: Vec<ColumnDefinition>,
    pub layouts: Vec<LayoutDefinition>,
    pub current_layout: Option<String>,
    pub hyperlinks: bool,
    pub advanced_column_types: Vec<ColumnType>,
    pub states: StateSources,
}

impl MetaData {
    /// Column types the client should offer advanced filter operators for.
    #[must_use]
    pub fn advanced_types() -> Vec<ColumnType> {
        ADVANCED_COLUMN_TYPES.to_vec()
    }

    /// Looks up a column by its output alias.
    #[must_use]
    pub fn column(&self, value: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.value == value)
    }
}

/// One page of grid rows with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridResponse {
    pub items: Vec<Row>,
    pub meta_data: MetaData,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn meta() -> MetaData {
        MetaData {
            table_ref: "users".to_string(),
            page: 1,
            items_per_page: 50,
            total_items: 0,
            total_pages: 0,
            sort_by: SortBy::new(),
            filters: Filters::new(),
            search: SearchState::default(),
            columns: vec![ColumnDefinition::simple(
                "name",
                "u.name",
                "Name",
                ColumnType::Plain,
            )],
            layouts: Vec::new(),
            current_layout: None,
            hyperlinks: false,
            advanced_column_types: MetaData::advanced_types(),
            states: StateSources::default(),
        }
    }

    #[test]
    fn serializes_client_wire_shape() {
        let response = GridResponse {
            items: Vec::new(),
            meta_data: meta(),
        };
        let json = serde_json::to_value(&response).unwrap();
        let meta = &json["metaData"];
        assert_eq!(meta["tableRef"], json!("users"));
        assert_eq!(meta["itemsPerPage"], json!(50));
        assert_eq!(meta["currentLayout"], json!(null));
        assert_eq!(
            meta["advancedColumnTypes"],
            json!(["number", "perc", "timestamp", "enum", "icon"])
        );
        assert_eq!(
            meta["states"],
            json!({"filter": "route", "search": "route", "sort": "route", "page": "route"})
        );
        assert_eq!(meta["search"], json!({"term": "", "recommendations": [], "queries": {}}));
    }

    #[test]
    fn column_lookup_by_alias() {
        let meta = meta();
        assert!(meta.column("name").is_some());
        assert!(meta.column("u.name").is_none());
    }
}
