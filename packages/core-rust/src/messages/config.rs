//! Persisted per-grid configuration record.

use serde::{Deserialize, Serialize};

use super::empty_list_as_default;
use crate::layout::LayoutDefinition;
use crate::state::{Filters, SearchState, SortBy};
use crate::types::Value;

/// Stored configuration for one grid reference and identity.
///
/// `search`, `sort` and `filters` are legacy fields. Only `filters` is still
/// read, and only by grids built with `filters_with_config()`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRecord {
    pub table_ref: String,
    /// Custom layouts saved by the user.
    #[serde(default, deserialize_with = "empty_list_as_default")]
    pub layouts: Vec<LayoutDefinition>,
    #[serde(default)]
    pub current_layout: Option<String>,
    #[serde(default, deserialize_with = "empty_list_as_default")]
    pub search: SearchState,
    #[serde(default, deserialize_with = "empty_list_as_default")]
    pub sort: SortBy,
    #[serde(default, deserialize_with = "empty_list_as_default")]
    pub filters: Filters,
}

impl ConfigRecord {
    /// The record created the first time a grid is served for a reference.
    #[must_use]
    pub fn new(table_ref: impl Into<String>) -> Self {
        Self {
            table_ref: table_ref.into(),
            ..Self::default()
        }
    }

    /// Replaces one top-level field with a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` does not have the field's shape; the record
    /// is left unchanged in that case.
    pub fn apply(&mut self, field: ConfigField, value: Value) -> Result<(), serde_json::Error> {
        let mut raw = serde_json::to_value(&*self)?;
        if let Value::Object(map) = &mut raw {
            map.insert(field.as_str().to_string(), value);
        }
        *self = serde_json::from_value(raw)?;
        Ok(())
    }
}

/// Top-level field of a [`ConfigRecord`] addressed by partial updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    Layouts,
    CurrentLayout,
    Search,
    Sort,
    Filters,
}

impl ConfigField {
    /// Wire name of the field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Layouts => "layouts",
            Self::CurrentLayout => "currentLayout",
            Self::Search => "search",
            Self::Sort => "sort",
            Self::Filters => "filters",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_record_with_php_style_empty_fields() {
        let record: ConfigRecord = serde_json::from_value(json!({
            "tableRef": "admin/users",
            "layouts": [],
            "currentLayout": null,
            "search": [],
            "sort": [],
            "filters": []
        }))
        .unwrap();
        assert_eq!(record, ConfigRecord::new("admin/users"));
    }

    #[test]
    fn apply_replaces_current_layout() {
        let mut record = ConfigRecord::new("users");
        record
            .apply(ConfigField::CurrentLayout, json!("predefined_0"))
            .unwrap();
        assert_eq!(record.current_layout.as_deref(), Some("predefined_0"));
        record.apply(ConfigField::CurrentLayout, Value::Null).unwrap();
        assert!(record.current_layout.is_none());
    }

    #[test]
    fn apply_rejects_wrong_shape_without_mutating() {
        let mut record = ConfigRecord::new("users");
        let err = record.apply(ConfigField::Layouts, json!("nope"));
        assert!(err.is_err());
        assert_eq!(record, ConfigRecord::new("users"));
    }

    #[test]
    fn apply_sets_layouts() {
        let mut record = ConfigRecord::new("users");
        record
            .apply(
                ConfigField::Layouts,
                json!([{"id": "custom_1", "label": "Mine", "columns": [{"value": "name"}], "custom": true}]),
            )
            .unwrap();
        assert_eq!(record.layouts.len(), 1);
        assert!(record.layouts[0].custom);
        assert_eq!(record.layouts[0].columns[0].order, 0);
    }
}
