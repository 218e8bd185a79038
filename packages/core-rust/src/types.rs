use std::borrow::Cow;

use serde::{Deserialize, Serialize};

pub use serde_json::Value;

/// One fetched result row, keyed by output column alias.
///
/// Rows come back from the data source as JSON objects so the post-processor
/// can add decoration fields (`<value>_icon`, `<value>_avatar_url`) without a
/// schema change.
pub type Row = serde_json::Map<String, Value>;

/// Sort direction for `ORDER BY` clauses and the `sortBy` wire mapping.
///
/// Accepts upper-case spellings on input because base queries and older
/// clients send `ASC`/`DESC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "ASC", alias = "Asc")]
    Asc,
    #[serde(alias = "DESC", alias = "Desc")]
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Authenticated identity used to scope persisted grid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Unique identifier for the authenticated user.
    pub id: String,
    /// Roles assigned to this principal.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Renders a scalar cell value as text for comparisons and lookups.
///
/// Returns `None` for JSON null. Booleans follow the database convention of
/// `1`/`0`. Arrays and objects render as compact JSON.
#[must_use]
pub fn value_as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "1" } else { "0" })),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        other => Some(Cow::Owned(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn sort_direction_accepts_upper_case() {
        let dir: SortDirection = serde_json::from_value(json!("DESC")).unwrap();
        assert_eq!(dir, SortDirection::Desc);
        assert_eq!(serde_json::to_value(dir).unwrap(), json!("desc"));
    }

    #[test]
    fn value_as_text_renders_scalars() {
        assert_eq!(value_as_text(&json!(null)), None);
        assert_eq!(value_as_text(&json!("a")).as_deref(), Some("a"));
        assert_eq!(value_as_text(&json!(15)).as_deref(), Some("15"));
        assert_eq!(value_as_text(&json!(true)).as_deref(), Some("1"));
    }
}
