//! Conditional icon rules for icon columns.

use serde::{Deserialize, Serialize};

use crate::compare::CompareOp;
use crate::error::IconError;

/// Colour applied to icons declared without an explicit one.
pub const DEFAULT_ICON_COLOR: &str = "grey";

/// One conditional icon assignment.
///
/// Rules are evaluated in declared order; the first non-default rule whose
/// `operator`/`value` test passes wins, otherwise the rule flagged `default`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconRule {
    pub icon: String,
    /// Comparison operand. `None` compares against null.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub operator: Option<CompareOp>,
    #[serde(default)]
    pub default: bool,
}

impl IconRule {
    /// A rule that applies when `row_value <operator> value` holds.
    #[must_use]
    pub fn when(operator: CompareOp, value: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            icon: icon.into(),
            value: Some(value.into()),
            color: None,
            tooltip: None,
            operator: Some(operator),
            default: false,
        }
    }

    /// The fallback rule used when nothing else matches.
    #[must_use]
    pub fn fallback(icon: impl Into<String>) -> Self {
        Self {
            icon: icon.into(),
            value: None,
            color: None,
            tooltip: None,
            operator: None,
            default: true,
        }
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    fn matches(&self, value: Option<&str>) -> bool {
        match self.operator {
            Some(op) => op.evaluate(value, self.value.as_deref()),
            None => false,
        }
    }
}

/// The decoration emitted for a row under `<key>_icon`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconDisplay {
    pub icon: String,
    pub color: Option<String>,
    pub tooltip: Option<String>,
}

impl From<&IconRule> for IconDisplay {
    fn from(rule: &IconRule) -> Self {
        Self {
            icon: rule.icon.clone(),
            color: rule.color.clone(),
            tooltip: rule.tooltip.clone(),
        }
    }
}

/// Picks the icon for `value` from `rules`.
///
/// # Errors
///
/// Returns [`IconError::NoMatchingRule`] when no rule matches and none is
/// flagged default.
pub fn select_icon(
    column: &str,
    rules: &[IconRule],
    value: Option<&str>,
) -> Result<IconDisplay, IconError> {
    rules
        .iter()
        .find(|rule| !rule.default && rule.matches(value))
        .or_else(|| rules.iter().find(|rule| rule.default))
        .map(IconDisplay::from)
        .ok_or_else(|| IconError::NoMatchingRule {
            column: column.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trend_rules() -> Vec<IconRule> {
        vec![
            IconRule::when(CompareOp::Gt, "10", "up").color("green"),
            IconRule::fallback("flat"),
        ]
    }

    #[test]
    fn first_matching_rule_wins() {
        let icon = select_icon("score", &trend_rules(), Some("15")).unwrap();
        assert_eq!(icon.icon, "up");
        assert_eq!(icon.color.as_deref(), Some("green"));
    }

    #[test]
    fn falls_back_to_default_rule() {
        let icon = select_icon("score", &trend_rules(), Some("5")).unwrap();
        assert_eq!(icon.icon, "flat");
    }

    #[test]
    fn default_rule_is_skipped_during_matching() {
        // A default rule listed first must not shadow later conditional rules.
        let rules = vec![
            IconRule::fallback("flat"),
            IconRule::when(CompareOp::Eq, "done", "check"),
        ];
        assert_eq!(select_icon("s", &rules, Some("done")).unwrap().icon, "check");
    }

    #[test]
    fn missing_default_is_an_error() {
        let rules = vec![IconRule::when(CompareOp::Eq, "1", "one")];
        let err = select_icon("status", &rules, Some("2")).unwrap_err();
        assert_eq!(
            err,
            IconError::NoMatchingRule {
                column: "status".to_string()
            }
        );
    }

    #[test]
    fn rule_deserializes_from_wire_shape() {
        let rule: IconRule = serde_json::from_value(serde_json::json!({
            "icon": "mdi-alert",
            "value": "0",
            "color": "red",
            "tooltip": "Empty",
            "operator": "<=",
            "default": false
        }))
        .unwrap();
        assert_eq!(rule.operator, Some(CompareOp::Lte));
        assert!(rule.matches(Some("-1")));
    }
}
