//! Column definitions and the fluent builder used to declare them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::icon::IconRule;

/// Display format handed to the client for timestamp columns.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "D MMMM YYYY";

/// Kind of a column, driving filter operators on the client and row decoration here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[serde(alias = "text", alias = "string")]
    Plain,
    Number,
    #[serde(rename = "perc", alias = "percentage")]
    Percentage,
    Timestamp,
    Enum,
    Icon,
    /// Not selected from the data source; filled in by the row mapper.
    Custom,
}

/// Column kinds that support filter operators beyond equality and substring search.
pub const ADVANCED_COLUMN_TYPES: [ColumnType; 5] = [
    ColumnType::Number,
    ColumnType::Percentage,
    ColumnType::Timestamp,
    ColumnType::Enum,
    ColumnType::Icon,
];

impl ColumnType {
    #[must_use]
    pub fn is_advanced(self) -> bool {
        ADVANCED_COLUMN_TYPES.contains(&self)
    }
}

/// One displayable, filterable field of a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Output alias, unique within a grid.
    pub value: String,
    /// Source expression.
    pub raw_value: String,
    pub label: String,
    #[serde(rename = "type")]
    pub r#type: ColumnType,
    pub index: usize,
    pub original_index: usize,
    pub hidden: bool,
    pub searchable: bool,
    pub sortable: bool,
    /// Computed after grouping; filtered through `HAVING`.
    pub is_aggregate: bool,
    /// `raw_value` must be projected `AS value`.
    pub is_raw: bool,
    pub is_advanced: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub raw_subtitle: Option<String>,
    #[serde(default)]
    pub subtitle_is_aggregate: bool,
    /// Join key expression into the attachment table.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub icon_condition_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub icon_condition_raw_value: Option<String>,
    #[serde(default)]
    pub icon_map: Vec<IconRule>,
    #[serde(default)]
    pub enumerators: BTreeMap<String, String>,
    pub timestamp_format: String,
}

impl ColumnDefinition {
    /// Starts a fully configurable column projecting `raw_value AS value`.
    #[must_use]
    pub fn builder(value: impl Into<String>, raw_value: impl Into<String>) -> ColumnBuilder {
        ColumnBuilder::new(value.into(), raw_value.into())
    }

    /// Builds a column the way the simple `add_*_column` helpers declare them:
    /// not raw, not aggregate, no subtitle or avatar.
    #[must_use]
    pub fn simple(
        value: impl Into<String>,
        raw_value: impl Into<String>,
        label: impl Into<String>,
        r#type: ColumnType,
    ) -> Self {
        Self {
            value: value.into(),
            raw_value: raw_value.into(),
            label: label.into(),
            r#type,
            index: 0,
            original_index: 0,
            hidden: false,
            searchable: true,
            sortable: true,
            is_aggregate: false,
            is_raw: false,
            is_advanced: r#type.is_advanced(),
            subtitle: None,
            raw_subtitle: None,
            subtitle_is_aggregate: false,
            avatar: None,
            icon_condition_value: None,
            icon_condition_raw_value: None,
            icon_map: Vec::new(),
            enumerators: BTreeMap::new(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }

    /// The expression a layout or metadata lookup keys this column by:
    /// the alias for raw columns, the source expression otherwise.
    #[must_use]
    pub fn state_key(&self) -> &str {
        if self.is_raw {
            &self.value
        } else {
            &self.raw_value
        }
    }

    /// Whether distinct-value enumerators should be generated at build time.
    #[must_use]
    pub fn needs_enumerators(&self) -> bool {
        match self.r#type {
            ColumnType::Enum => self.enumerators.is_empty(),
            ColumnType::Icon => self.enumerators.is_empty() && self.icon_map.is_empty(),
            _ => false,
        }
    }

    /// Whether this column drives the per-row icon decoration.
    #[must_use]
    pub fn has_icon(&self) -> bool {
        self.r#type == ColumnType::Icon || self.icon_condition_value.is_some()
    }
}

/// Alias derived from the last `.`-separated segment of an expression
/// (`u.first_name` becomes `first_name`).
#[must_use]
pub fn basic_alias(expression: &str) -> &str {
    expression.rsplit('.').next().unwrap_or(expression)
}

/// Fluent builder for advanced columns.
#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    column: ColumnDefinition,
    raw_override: Option<bool>,
}

impl ColumnBuilder {
    fn new(value: String, raw_value: String) -> Self {
        let label = value.clone();
        Self {
            column: ColumnDefinition::simple(value, raw_value, label, ColumnType::Plain),
            raw_override: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.column.label = label.into();
        self
    }

    #[must_use]
    pub fn kind(mut self, r#type: ColumnType) -> Self {
        self.column.r#type = r#type;
        self.column.is_advanced = r#type.is_advanced();
        self
    }

    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.column.hidden = hidden;
        self
    }

    #[must_use]
    pub fn searchable(mut self, searchable: bool) -> Self {
        self.column.searchable = searchable;
        self
    }

    #[must_use]
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.column.sortable = sortable;
        self
    }

    #[must_use]
    pub fn aggregate(mut self) -> Self {
        self.column.is_aggregate = true;
        self
    }

    /// Overrides the raw flag. By default a column is raw when its alias differs
    /// from its source expression.
    #[must_use]
    pub fn raw(mut self, is_raw: bool) -> Self {
        self.raw_override = Some(is_raw);
        self
    }

    /// Secondary display line, projected `raw AS alias`.
    #[must_use]
    pub fn subtitle(mut self, alias: impl Into<String>, raw: impl Into<String>) -> Self {
        self.column.subtitle = Some(alias.into());
        self.column.raw_subtitle = Some(raw.into());
        self
    }

    #[must_use]
    pub fn subtitle_aggregate(mut self) -> Self {
        self.column.subtitle_is_aggregate = true;
        self
    }

    /// Expression joined against the attachment table's file id.
    #[must_use]
    pub fn avatar(mut self, join_key: impl Into<String>) -> Self {
        self.column.avatar = Some(join_key.into());
        self
    }

    /// Alternate expression driving icon selection, projected `raw AS alias`.
    #[must_use]
    pub fn icon_condition(mut self, alias: impl Into<String>, raw: impl Into<String>) -> Self {
        self.column.icon_condition_value = Some(alias.into());
        self.column.icon_condition_raw_value = Some(raw.into());
        self
    }

    #[must_use]
    pub fn icon_rules(mut self, rules: Vec<IconRule>) -> Self {
        self.column.icon_map = rules;
        self
    }

    #[must_use]
    pub fn enumerators<K, V>(mut self, enumerators: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.column.enumerators = enumerators
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    #[must_use]
    pub fn timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.column.timestamp_format = format.into();
        self
    }

    #[must_use]
    pub fn build(mut self) -> ColumnDefinition {
        self.column.is_raw = self
            .raw_override
            .unwrap_or(self.column.value != self.column.raw_value);
        self.column
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builder_marks_aliased_columns_raw() {
        let col = ColumnDefinition::builder("total", "SUM(o.amount)")
            .label("Total")
            .kind(ColumnType::Number)
            .aggregate()
            .build();
        assert!(col.is_raw);
        assert!(col.is_aggregate);
        assert!(col.is_advanced);
        assert_eq!(col.state_key(), "total");
    }

    #[test]
    fn builder_keeps_identity_columns_unaliased() {
        let col = ColumnDefinition::builder("email", "email").build();
        assert!(!col.is_raw);
        assert_eq!(col.state_key(), "email");
    }

    #[test]
    fn basic_alias_takes_last_segment() {
        assert_eq!(basic_alias("u.first_name"), "first_name");
        assert_eq!(basic_alias("status"), "status");
    }

    #[test]
    fn enum_without_enumerators_needs_generation() {
        let col = ColumnDefinition::simple("status", "u.status", "Status", ColumnType::Enum);
        assert!(col.needs_enumerators());
        let col = ColumnDefinition::builder("status", "u.status")
            .kind(ColumnType::Enum)
            .enumerators([("1", "Active")])
            .build();
        assert!(!col.needs_enumerators());
    }

    #[test]
    fn serializes_camel_case_wire_shape() {
        let col = ColumnDefinition::simple("pct", "o.pct", "Pct", ColumnType::Percentage);
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json["type"], json!("perc"));
        assert_eq!(json["rawValue"], json!("o.pct"));
        assert_eq!(json["isAdvanced"], json!(true));
        assert_eq!(json["timestampFormat"], json!("D MMMM YYYY"));
        assert!(json.get("subtitle").is_none());
    }
}
