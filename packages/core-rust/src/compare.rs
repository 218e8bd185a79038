//! Comparison interpreter used to pick an icon rule for a row value.
//!
//! Operators form a closed set. Operands are coerced pairwise before ordering
//! comparisons:
//!
//! - both sides parse as numbers: numeric comparison
//! - both sides parse as dates or datetimes: chronological comparison
//! - otherwise: plain string comparison
//!
//! `===` and `!==` never coerce; they compare the text exactly.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Comparison operator carried by an icon rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "=", alias = "==")]
    Eq,
    #[serde(rename = "===")]
    StrictEq,
    #[serde(rename = "!=", alias = "<>")]
    Ne,
    #[serde(rename = "!==")]
    StrictNe,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "not_contains")]
    NotContains,
    #[serde(rename = "starts_with")]
    StartsWith,
    #[serde(rename = "ends_with")]
    EndsWith,
    /// Target is a comma-separated list.
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not_in")]
    NotIn,
    /// Ignores the target; true when the row value is null or empty.
    #[serde(rename = "null")]
    Null,
    #[serde(rename = "not_null")]
    NotNull,
}

impl CompareOp {
    /// Parses the textual operator form (`">="`, `"contains"`, ...).
    #[must_use]
    pub fn parse(op: &str) -> Option<Self> {
        let op = match op.trim() {
            "=" | "==" => Self::Eq,
            "===" => Self::StrictEq,
            "!=" | "<>" => Self::Ne,
            "!==" => Self::StrictNe,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Gte,
            "<=" => Self::Lte,
            "contains" => Self::Contains,
            "not_contains" => Self::NotContains,
            "starts_with" => Self::StartsWith,
            "ends_with" => Self::EndsWith,
            "in" => Self::In,
            "not_in" => Self::NotIn,
            "null" => Self::Null,
            "not_null" => Self::NotNull,
            _ => return None,
        };
        Some(op)
    }

    /// Canonical textual form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::StrictEq => "===",
            Self::Ne => "!=",
            Self::StrictNe => "!==",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Null => "null",
            Self::NotNull => "not_null",
        }
    }

    /// Evaluates `value <op> target`.
    ///
    /// `value` is the row's cell (None for null), `target` is the rule operand.
    #[must_use]
    pub fn evaluate(self, value: Option<&str>, target: Option<&str>) -> bool {
        let value_empty = value.map_or(true, str::is_empty);
        match self {
            Self::Null => return value_empty,
            Self::NotNull => return !value_empty,
            _ => {}
        }

        let (Some(value), Some(target)) = (value, target) else {
            // A null on either side only supports (in)equality.
            let both_empty = value_empty && target.map_or(true, str::is_empty);
            return match self {
                Self::Eq | Self::StrictEq => both_empty,
                Self::Ne | Self::StrictNe => !both_empty,
                _ => false,
            };
        };

        match self {
            Self::StrictEq => value == target,
            Self::StrictNe => value != target,
            Self::Eq => coerced_cmp(value, target) == Ordering::Equal,
            Self::Ne => coerced_cmp(value, target) != Ordering::Equal,
            Self::Gt => coerced_cmp(value, target) == Ordering::Greater,
            Self::Lt => coerced_cmp(value, target) == Ordering::Less,
            Self::Gte => coerced_cmp(value, target) != Ordering::Less,
            Self::Lte => coerced_cmp(value, target) != Ordering::Greater,
            Self::Contains => value.contains(target),
            Self::NotContains => !value.contains(target),
            Self::StartsWith => value.starts_with(target),
            Self::EndsWith => value.ends_with(target),
            Self::In => list_contains(target, value),
            Self::NotIn => !list_contains(target, value),
            Self::Null | Self::NotNull => unreachable!("handled above"),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operand after type coercion.
#[derive(Debug, PartialEq, PartialOrd)]
enum Operand<'a> {
    Number(f64),
    Date(NaiveDateTime),
    Text(&'a str),
}

fn coerced_cmp(left: &str, right: &str) -> Ordering {
    let pair = match (parse_number(left), parse_number(right)) {
        (Some(l), Some(r)) => (Operand::Number(l), Operand::Number(r)),
        _ => match (parse_datetime(left), parse_datetime(right)) {
            (Some(l), Some(r)) => (Operand::Date(l), Operand::Date(r)),
            _ => (Operand::Text(left), Operand::Text(right)),
        },
    };
    // NaN is the only incomparable operand; treat it as unequal-and-less.
    pair.0.partial_cmp(&pair.1).unwrap_or(Ordering::Less)
}

fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn list_contains(list: &str, value: &str) -> bool {
    list.split(',')
        .map(str::trim)
        .any(|item| coerced_cmp(value, item) == Ordering::Equal)
}
