//! Translates grid state into [`QueryPlan`] clauses.
//!
//! Stages run in a fixed order: selects, sort, search, filters, paging. Keys
//! that resolve to no column (or to a custom column) are skipped with a debug
//! log; nothing here fails.

use gridshape_core::plan::{JoinKind, SelectItem};
use gridshape_core::registry::{Alias, Resolution, FILTER_RESOLUTION_ORDER, RESOLUTION_ORDER};
use gridshape_core::types::value_as_text;
use gridshape_core::{
    ColumnDefinition, ColumnRegistry, ColumnType, FilterSpec, Filters, GridState, Predicate,
    QueryPlan, SearchState, SortBy, SqlOperator, Value,
};

/// Suffix the client appends to filter keys of icon columns.
pub(crate) const ICON_SUFFIX: &str = "_icon";

/// Output alias suffixes for the attachment fields of avatar columns.
pub(crate) const FILE_KEY_SUFFIX: &str = "_file_key";
pub(crate) const FILE_DISK_SUFFIX: &str = "_file_disk";
pub(crate) const FILE_BASE_URL_SUFFIX: &str = "_file_base_url";

/// Filter operators accepted from clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterOperator {
    Compare(SqlOperator),
    Like { negated: bool },
}

impl FilterOperator {
    fn parse(operator: &str) -> Option<Self> {
        let operator = operator.trim();
        Some(match operator {
            "=" | "===" => Self::Compare(SqlOperator::Eq),
            "!=" | "<>" => Self::Compare(SqlOperator::Ne),
            ">" => Self::Compare(SqlOperator::Gt),
            "<" => Self::Compare(SqlOperator::Lt),
            ">=" => Self::Compare(SqlOperator::Gte),
            "<=" => Self::Compare(SqlOperator::Lte),
            _ if operator.eq_ignore_ascii_case("like") => Self::Like { negated: false },
            _ if operator.eq_ignore_ascii_case("not like") => Self::Like { negated: true },
            _ => return None,
        })
    }
}

/// Builds query clauses for one grid's columns.
pub(crate) struct QueryCompiler<'a> {
    registry: &'a ColumnRegistry,
    attachment_table: &'a str,
}

impl<'a> QueryCompiler<'a> {
    pub(crate) fn new(registry: &'a ColumnRegistry, attachment_table: &'a str) -> Self {
        Self {
            registry,
            attachment_table,
        }
    }

    /// Projects every non-custom column plus the declared extra selects.
    pub(crate) fn apply_selects(&self, plan: &mut QueryPlan, extra_selects: &[String]) {
        for column in self.registry.iter() {
            if column.r#type == ColumnType::Custom {
                continue;
            }
            if column.is_raw {
                plan.add_select(SelectItem::aliased(&column.raw_value, &column.value));
            } else {
                plan.add_select(SelectItem::new(&column.raw_value));
            }
            if let (Some(raw), Some(alias)) = (&column.raw_subtitle, &column.subtitle) {
                plan.add_select(SelectItem::aliased(raw, alias));
            }
            if let (Some(raw), Some(alias)) =
                (&column.icon_condition_raw_value, &column.icon_condition_value)
            {
                plan.add_select(SelectItem::aliased(raw, alias));
            }
            self.select_avatar(plan, column);
        }
        for select in extra_selects {
            plan.add_select(SelectItem::new(select));
        }
    }

    fn select_avatar(&self, plan: &mut QueryPlan, column: &ColumnDefinition) {
        let Some(join_key) = &column.avatar else {
            return;
        };
        let alias = format!("{}_file", column.value);
        plan.add_join(
            JoinKind::Left,
            self.attachment_table,
            Some(alias.clone()),
            format!("{join_key} = {alias}.fileid"),
        );
        for (field, suffix) in [
            ("thumbnail_key", FILE_KEY_SUFFIX),
            ("disk", FILE_DISK_SUFFIX),
            ("base_url", FILE_BASE_URL_SUFFIX),
        ] {
            plan.add_select(SelectItem::aliased(
                format!("{alias}.{field}"),
                format!("{}{suffix}", column.value),
            ));
        }
    }

    fn resolve(&self, stage: &str, key: &str) -> Option<Resolution<'a>> {
        self.resolve_with(stage, key, &RESOLUTION_ORDER)
    }

    fn resolve_with(&self, stage: &str, key: &str, order: &[Alias]) -> Option<Resolution<'a>> {
        match self.registry.resolve_with(key, order) {
            Some(hit) if hit.column.r#type != ColumnType::Custom => Some(hit),
            Some(_) => {
                tracing::debug!(stage, key, "skipping custom column");
                None
            }
            None => {
                tracing::debug!(stage, key, "no column matches key");
                None
            }
        }
    }

    pub(crate) fn apply_sort(&self, plan: &mut QueryPlan, sort_by: &SortBy) {
        for (key, direction) in sort_by {
            if let Some(hit) = self.resolve("sort", key) {
                plan.add_order(hit.order_expression(), *direction);
            }
        }
    }

    /// Adds one OR-group of substring matches per clause, then clears the
    /// free-text term.
    ///
    /// Terms for all non-aggregate keys form a single `WHERE` group and terms
    /// for aggregate keys a single `HAVING` group, so a row matches when any
    /// term matches while the rest of the query still constrains it.
    pub(crate) fn apply_search(&self, plan: &mut QueryPlan, search: &mut SearchState) {
        let mut where_terms = Vec::new();
        let mut having_terms = Vec::new();
        for (key, terms) in &search.queries {
            let Some(hit) = self.resolve("search", key) else {
                continue;
            };
            let target = if hit.is_aggregate() {
                &mut having_terms
            } else {
                &mut where_terms
            };
            target.extend(
                terms
                    .iter()
                    .map(|term| Predicate::contains_ci(hit.expression(), term)),
            );
        }
        if !where_terms.is_empty() {
            plan.and_where(Predicate::any_of(where_terms));
        }
        if !having_terms.is_empty() {
            plan.and_having(Predicate::any_of(having_terms));
        }
        search.term.clear();
    }

    /// Adds one conjunctive predicate per resolvable filter.
    pub(crate) fn apply_filters(&self, plan: &mut QueryPlan, filters: &Filters) {
        for (key, spec) in filters {
            if spec.is_empty() {
                continue;
            }
            let identifier = key.strip_suffix(ICON_SUFFIX).unwrap_or(key);
            let Some(hit) = self.resolve_with("filter", identifier, &FILTER_RESOLUTION_ORDER)
            else {
                continue;
            };
            let Some(predicate) = filter_predicate(&hit, spec) else {
                tracing::debug!(key = %key, operator = ?spec.operator, "skipping unsupported filter");
                continue;
            };
            if hit.is_aggregate() {
                plan.and_having(predicate);
            } else {
                plan.and_where(predicate);
            }
        }
    }
}

fn filter_predicate(hit: &Resolution<'_>, spec: &FilterSpec) -> Option<Predicate> {
    let operator = FilterOperator::parse(spec.operator.as_deref()?)?;
    let expression = hit.expression();
    let text = value_as_text(&spec.value);

    if hit.column.r#type == ColumnType::Timestamp
        && operator == FilterOperator::Compare(SqlOperator::Eq)
    {
        // Date-only values match any time on that day.
        return Some(match text.filter(|t| !t.is_empty()) {
            Some(day) => Predicate::like(expression, format!("{day}%"), false),
            None => Predicate::is_null(expression, false),
        });
    }

    match (operator, text) {
        (FilterOperator::Compare(SqlOperator::Eq), None) => {
            Some(Predicate::is_null(expression, false))
        }
        (FilterOperator::Compare(SqlOperator::Ne), None) => {
            Some(Predicate::is_null(expression, true))
        }
        (_, None) => None,
        (FilterOperator::Compare(op), Some(text)) => {
            let value = match &spec.value {
                Value::Bool(_) => Value::String(text.into_owned()),
                other => other.clone(),
            };
            Some(Predicate::compare(expression, op, value))
        }
        (FilterOperator::Like { negated }, Some(pattern)) => {
            Some(Predicate::like(expression, pattern.into_owned(), negated))
        }
    }
}

/// Applies offset and limit for the current page. An explicit limit already
/// on the plan is kept. Paging is skipped entirely when disabled.
pub(crate) fn apply_paging(plan: &mut QueryPlan, state: &GridState) {
    if let Some((offset, per_page)) = state.page_window() {
        plan.offset = Some(offset);
        plan.limit = Some(plan.limit.unwrap_or(per_page));
    }
}
