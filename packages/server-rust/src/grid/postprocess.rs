//! Row decoration after the page query: avatar URLs, icons, enum labels and
//! the user-supplied row mapper, applied in that order.

use std::time::Duration;

use gridshape_core::types::value_as_text;
use gridshape_core::{select_icon, ColumnDefinition, ColumnRegistry, ColumnType, Row, Value};

use super::compiler::{FILE_BASE_URL_SUFFIX, FILE_DISK_SUFFIX, FILE_KEY_SUFFIX, ICON_SUFFIX};
use super::RowMapper;
use crate::error::GridError;
use crate::traits::AttachmentStorage;

const AVATAR_URL_SUFFIX: &str = "_avatar_url";

pub(crate) struct PostProcessor<'a> {
    pub(crate) registry: &'a ColumnRegistry,
    pub(crate) attachments: &'a dyn AttachmentStorage,
    pub(crate) object_storage_disk: &'a str,
    pub(crate) url_validity: Duration,
    pub(crate) mapper: Option<&'a RowMapper>,
}

impl PostProcessor<'_> {
    /// Decorates every row and hands it to the mapper, if any.
    ///
    /// # Errors
    ///
    /// Fails when attachment storage cannot sign a URL or when a row matches
    /// no icon rule and none is flagged default.
    pub(crate) async fn process(&self, rows: Vec<Row>) -> Result<Vec<Row>, GridError> {
        let avatars: Vec<&ColumnDefinition> = self
            .registry
            .iter()
            .filter(|c| c.avatar.is_some())
            .collect();
        let icon_column = self.icon_column();
        let enums: Vec<&ColumnDefinition> = self
            .registry
            .iter()
            .filter(|c| c.r#type == ColumnType::Enum && !c.enumerators.is_empty())
            .collect();

        let mut decorated = Vec::with_capacity(rows.len());
        for mut row in rows {
            for column in &avatars {
                self.avatar_url(&mut row, column).await?;
            }
            if let Some(column) = icon_column {
                decorate_icon(&mut row, column)?;
            }
            for column in &enums {
                substitute_enum(&mut row, column);
            }
            decorated.push(match self.mapper {
                Some(mapper) => mapper(row),
                None => row,
            });
        }
        Ok(decorated)
    }

    /// Only one icon is decorated per row: the first icon column, or failing
    /// that the first column with an icon condition.
    fn icon_column(&self) -> Option<&ColumnDefinition> {
        self.registry
            .iter()
            .find(|c| c.r#type == ColumnType::Icon)
            .or_else(|| {
                self.registry
                    .iter()
                    .find(|c| c.icon_condition_value.is_some())
            })
            .filter(|c| !c.icon_map.is_empty())
    }

    async fn avatar_url(&self, row: &mut Row, column: &ColumnDefinition) -> Result<(), GridError> {
        let mut take = |suffix: &str| {
            row.remove(&format!("{}{suffix}", column.value))
                .and_then(|v| value_as_text(&v).map(|t| t.into_owned()))
                .filter(|t| !t.is_empty())
        };
        let key = take(FILE_KEY_SUFFIX);
        let disk = take(FILE_DISK_SUFFIX);
        let base_url = take(FILE_BASE_URL_SUFFIX);

        let url = match (disk, key) {
            (Some(disk), Some(key)) if disk == self.object_storage_disk => match base_url {
                Some(base) => format!("{}/{key}", base.trim_end_matches('/')),
                None => key,
            },
            (Some(disk), Some(key)) => {
                self.attachments
                    .resolve_url(&disk, &key, base_url.as_deref(), self.url_validity)
                    .await?
            }
            _ => String::new(),
        };
        row.insert(
            format!("{}{AVATAR_URL_SUFFIX}", column.value),
            Value::String(url),
        );
        Ok(())
    }
}

fn decorate_icon(row: &mut Row, column: &ColumnDefinition) -> Result<(), GridError> {
    let key = column
        .icon_condition_value
        .as_deref()
        .unwrap_or(&column.value);
    let icon = {
        let value = row.get(key).and_then(value_as_text);
        select_icon(&column.value, &column.icon_map, value.as_deref())?
    };
    let icon = serde_json::to_value(icon).map_err(anyhow::Error::from)?;
    row.insert(format!("{key}{ICON_SUFFIX}"), icon);
    Ok(())
}

/// Replaces a stored enum value with its label. Blank stored values (`null`,
/// `false`, `0`, `""` and `"0"`) are left as they are even when a label is
/// mapped for them, and so are values whose label is empty.
fn substitute_enum(row: &mut Row, column: &ColumnDefinition) {
    let Some(slot) = row.get_mut(&column.value) else {
        return;
    };
    if is_blank(slot) {
        return;
    }
    let label = value_as_text(slot)
        .and_then(|raw| column.enumerators.get(raw.as_ref()))
        .filter(|label| !label.is_empty())
        .cloned();
    if let Some(label) = label {
        *slot = Value::String(label);
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        _ => false,
    }
}
