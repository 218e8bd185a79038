//! Column registry and alias resolution.
//!
//! A user-supplied key (from `sortBy`, `search.queries` or `filters`) may name
//! a column by any of six aliases. [`ColumnRegistry`] keeps one lookup table per
//! alias kind and probes them in a fixed priority order, so resolution is a
//! handful of hash lookups and always deterministic.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::column::{ColumnDefinition, ColumnType};
use crate::error::BuildError;

/// Which facet of a column a resolved key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aspect {
    Value,
    Subtitle,
    IconCondition,
}

/// One of the names a column can be referenced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alias {
    RawValue,
    Value,
    RawSubtitle,
    Subtitle,
    IconConditionRaw,
    IconConditionValue,
}

impl Alias {
    const ALL: [Alias; 6] = [
        Alias::RawValue,
        Alias::Value,
        Alias::RawSubtitle,
        Alias::Subtitle,
        Alias::IconConditionRaw,
        Alias::IconConditionValue,
    ];

    #[must_use]
    pub fn aspect(self) -> Aspect {
        match self {
            Alias::RawValue | Alias::Value => Aspect::Value,
            Alias::RawSubtitle | Alias::Subtitle => Aspect::Subtitle,
            Alias::IconConditionRaw | Alias::IconConditionValue => Aspect::IconCondition,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }

    fn of(self, column: &ColumnDefinition) -> Option<&str> {
        match self {
            Alias::RawValue => Some(&column.raw_value),
            Alias::Value => Some(&column.value),
            Alias::RawSubtitle => column.raw_subtitle.as_deref(),
            Alias::Subtitle => column.subtitle.as_deref(),
            Alias::IconConditionRaw => column.icon_condition_raw_value.as_deref(),
            Alias::IconConditionValue => column.icon_condition_value.as_deref(),
        }
    }
}

/// Priority used by sort and search resolution.
pub const RESOLUTION_ORDER: [Alias; 6] = [
    Alias::RawValue,
    Alias::Value,
    Alias::RawSubtitle,
    Alias::Subtitle,
    Alias::IconConditionRaw,
    Alias::IconConditionValue,
];

/// Priority used by filter resolution (display subtitle before its source expression).
pub const FILTER_RESOLUTION_ORDER: [Alias; 6] = [
    Alias::RawValue,
    Alias::Value,
    Alias::Subtitle,
    Alias::RawSubtitle,
    Alias::IconConditionRaw,
    Alias::IconConditionValue,
];

/// A key resolved to a column and the facet it names.
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub column: &'a ColumnDefinition,
    /// Position of the column in declaration order.
    pub position: usize,
    pub aspect: Aspect,
}

impl<'a> Resolution<'a> {
    /// Source expression for the resolved facet, usable in `WHERE`/`HAVING`.
    #[must_use]
    pub fn expression(&self) -> &'a str {
        let column = self.column;
        match self.aspect {
            Aspect::Value => &column.raw_value,
            Aspect::Subtitle => column.raw_subtitle.as_deref().unwrap_or(&column.raw_value),
            Aspect::IconCondition => column
                .icon_condition_raw_value
                .as_deref()
                .unwrap_or(&column.raw_value),
        }
    }

    /// Expression to order by: the projected alias when one exists, else the source.
    #[must_use]
    pub fn order_expression(&self) -> &'a str {
        let column = self.column;
        match self.aspect {
            Aspect::Value if column.is_raw => &column.value,
            Aspect::Value => &column.raw_value,
            Aspect::Subtitle => column.subtitle.as_deref().unwrap_or(&column.raw_value),
            Aspect::IconCondition => column
                .icon_condition_value
                .as_deref()
                .unwrap_or(&column.raw_value),
        }
    }

    /// Whether predicates on this facet belong in `HAVING`.
    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        match self.aspect {
            Aspect::Subtitle => self.column.is_aggregate || self.column.subtitle_is_aggregate,
            Aspect::Value | Aspect::IconCondition => self.column.is_aggregate,
        }
    }
}

fn alias_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern"))
}

fn check_alias(alias: &str) -> Result<(), BuildError> {
    if alias_pattern().is_match(alias) {
        Ok(())
    } else {
        Err(BuildError::InvalidAlias {
            alias: alias.to_string(),
        })
    }
}

/// Ordered set of column definitions for one grid instance.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    columns: Vec<ColumnDefinition>,
    lookup: [HashMap<String, usize>; 6],
}

impl ColumnRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column, assigning the next sequential index.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicateColumn`] if the output alias is taken and
    /// [`BuildError::InvalidAlias`] if a projected alias is not a plain identifier.
    pub fn push(&mut self, mut column: ColumnDefinition) -> Result<usize, BuildError> {
        if self.lookup[Alias::Value.slot()].contains_key(&column.value) {
            return Err(BuildError::DuplicateColumn {
                value: column.value,
            });
        }
        if column.r#type != ColumnType::Custom {
            if column.is_raw {
                check_alias(&column.value)?;
            }
            for alias in [&column.subtitle, &column.icon_condition_value]
                .into_iter()
                .flatten()
            {
                check_alias(alias)?;
            }
        }

        let position = self.columns.len();
        column.index = position;
        column.original_index = position;
        for alias in Alias::ALL {
            if let Some(name) = alias.of(&column) {
                // First declaration wins, matching declaration-order lookup.
                self.lookup[alias.slot()]
                    .entry(name.to_string())
                    .or_insert(position);
            }
        }
        self.columns.push(column);
        Ok(position)
    }

    /// Resolves `key` using [`RESOLUTION_ORDER`].
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<Resolution<'_>> {
        self.resolve_with(key, &RESOLUTION_ORDER)
    }

    /// Resolves `key` by probing aliases in `order`; the first hit wins.
    /// A miss is not an error: stale keys are skipped by callers.
    #[must_use]
    pub fn resolve_with(&self, key: &str, order: &[Alias]) -> Option<Resolution<'_>> {
        order.iter().find_map(|alias| {
            self.lookup[alias.slot()]
                .get(key)
                .map(|&position| Resolution {
                    column: &self.columns[position],
                    position,
                    aspect: alias.aspect(),
                })
        })
    }

    /// Whether a layout column key names a registered column by value or raw value.
    #[must_use]
    pub fn has_layout_key(&self, key: &str) -> bool {
        self.lookup[Alias::Value.slot()].contains_key(key)
            || self.lookup[Alias::RawValue.slot()].contains_key(key)
    }

    #[must_use]
    pub fn get(&self, value: &str) -> Option<&ColumnDefinition> {
        self.lookup[Alias::Value.slot()]
            .get(value)
            .map(|&position| &self.columns[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter()
    }

    /// Mutable access for display state (`hidden`, `index`, enumerators).
    /// Aliases must not be changed through this.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ColumnDefinition> {
        self.columns.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Column labels in display order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        let mut ordered: Vec<&ColumnDefinition> = self.columns.iter().collect();
        ordered.sort_by_key(|c| c.index);
        ordered.into_iter().map(|c| c.label.clone()).collect()
    }
}
