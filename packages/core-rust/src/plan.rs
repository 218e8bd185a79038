//! Query plan intermediate representation.
//!
//! The grid pipeline never talks to a query builder directly. Each stage adds
//! select items, joins, predicates and orders to a [`QueryPlan`], and the plan
//! is handed to a data source once complete. Expressions stored in the plan
//! come from code (column declarations, base query) and are trusted; values
//! that originate from a request are only ever carried as [`Value`]s and bound
//! as parameters by the renderer in [`crate::sql`].

use serde::{Deserialize, Serialize};

use crate::types::{SortDirection, Value};

/// One projected expression, optionally aliased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectItem {
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alias: Option<String>,
}

impl SelectItem {
    #[must_use]
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            alias: None,
        }
    }

    #[must_use]
    pub fn aliased(expression: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            alias: Some(alias.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Left,
    Inner,
}

/// A join against `table AS alias ON on`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alias: Option<String>,
    pub on: String,
}

/// How a condition attaches to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connective {
    And,
    Or,
}

/// Binary comparison operators that take a bound value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
}

impl SqlOperator {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }

    /// Whether the operator orders its operands (as opposed to testing equality).
    #[must_use]
    pub fn is_ordering(self) -> bool {
        matches!(self, Self::Gt | Self::Lt | Self::Gte | Self::Lte)
    }
}

/// A boolean test in a `WHERE` or `HAVING` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Predicate {
    /// Trusted SQL fragment, embedded verbatim.
    Raw { sql: String },
    Compare {
        expression: String,
        operator: SqlOperator,
        value: Value,
    },
    Like {
        expression: String,
        pattern: String,
        negated: bool,
        /// Lower-cases the expression before matching; the pattern is expected
        /// to be lower case already.
        case_insensitive: bool,
    },
    IsNull { expression: String, negated: bool },
    /// Parenthesised sub-list.
    Group { conditions: Vec<Condition> },
}

impl Predicate {
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw { sql: sql.into() }
    }

    #[must_use]
    pub fn compare(expression: impl Into<String>, operator: SqlOperator, value: Value) -> Self {
        Self::Compare {
            expression: expression.into(),
            operator,
            value,
        }
    }

    /// Case-insensitive substring match: `LOWER(expression) LIKE '%needle%'`.
    #[must_use]
    pub fn contains_ci(expression: impl Into<String>, needle: &str) -> Self {
        Self::Like {
            expression: expression.into(),
            pattern: format!("%{}%", needle.to_lowercase()),
            negated: false,
            case_insensitive: true,
        }
    }

    #[must_use]
    pub fn like(expression: impl Into<String>, pattern: impl Into<String>, negated: bool) -> Self {
        Self::Like {
            expression: expression.into(),
            pattern: pattern.into(),
            negated,
            case_insensitive: false,
        }
    }

    #[must_use]
    pub fn is_null(expression: impl Into<String>, negated: bool) -> Self {
        Self::IsNull {
            expression: expression.into(),
            negated,
        }
    }

    /// Conditions joined by `OR` inside one pair of parentheses.
    #[must_use]
    pub fn any_of(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Group {
            conditions: predicates
                .into_iter()
                .enumerate()
                .map(|(i, predicate)| Condition {
                    connective: if i == 0 { Connective::And } else { Connective::Or },
                    predicate,
                })
                .collect(),
        }
    }
}

/// A predicate and how it attaches to its predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub connective: Connective,
    pub predicate: Predicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub expression: String,
    pub direction: SortDirection,
}

/// A select query under construction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPlan {
    /// Table expression, e.g. `users u`.
    pub from: String,
    pub distinct: bool,
    pub selects: Vec<SelectItem>,
    pub joins: Vec<Join>,
    pub wheres: Vec<Condition>,
    pub group_by: Vec<String>,
    pub havings: Vec<Condition>,
    pub orders: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QueryPlan {
    /// Starts a plan reading from `from`.
    #[must_use]
    pub fn table(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn select(mut self, expression: impl Into<String>) -> Self {
        self.add_select(SelectItem::new(expression));
        self
    }

    #[must_use]
    pub fn select_as(mut self, expression: impl Into<String>, alias: impl Into<String>) -> Self {
        self.add_select(SelectItem::aliased(expression, alias));
        self
    }

    #[must_use]
    pub fn left_join(
        mut self,
        table: impl Into<String>,
        alias: impl Into<String>,
        on: impl Into<String>,
    ) -> Self {
        self.add_join(JoinKind::Left, table, Some(alias.into()), on);
        self
    }

    #[must_use]
    pub fn inner_join(
        mut self,
        table: impl Into<String>,
        alias: impl Into<String>,
        on: impl Into<String>,
    ) -> Self {
        self.add_join(JoinKind::Inner, table, Some(alias.into()), on);
        self
    }

    /// Adds a trusted `WHERE` fragment joined with `AND`.
    #[must_use]
    pub fn where_raw(mut self, sql: impl Into<String>) -> Self {
        self.and_where(Predicate::raw(sql));
        self
    }

    /// Adds a trusted `WHERE` fragment joined with `OR`.
    #[must_use]
    pub fn or_where_raw(mut self, sql: impl Into<String>) -> Self {
        self.or_where(Predicate::raw(sql));
        self
    }

    #[must_use]
    pub fn group_by(mut self, expression: impl Into<String>) -> Self {
        self.group_by.push(expression.into());
        self
    }

    #[must_use]
    pub fn having_raw(mut self, sql: impl Into<String>) -> Self {
        self.and_having(Predicate::raw(sql));
        self
    }

    #[must_use]
    pub fn order_by(mut self, expression: impl Into<String>, direction: SortDirection) -> Self {
        self.add_order(expression, direction);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn add_select(&mut self, item: SelectItem) {
        self.selects.push(item);
    }

    pub fn add_join(
        &mut self,
        kind: JoinKind,
        table: impl Into<String>,
        alias: Option<String>,
        on: impl Into<String>,
    ) {
        self.joins.push(Join {
            kind,
            table: table.into(),
            alias,
            on: on.into(),
        });
    }

    pub fn and_where(&mut self, predicate: Predicate) {
        self.wheres.push(Condition {
            connective: Connective::And,
            predicate,
        });
    }

    pub fn or_where(&mut self, predicate: Predicate) {
        self.wheres.push(Condition {
            connective: Connective::Or,
            predicate,
        });
    }

    pub fn and_having(&mut self, predicate: Predicate) {
        self.havings.push(Condition {
            connective: Connective::And,
            predicate,
        });
    }

    pub fn add_order(&mut self, expression: impl Into<String>, direction: SortDirection) {
        self.orders.push(OrderBy {
            expression: expression.into(),
            direction,
        });
    }

    /// Removes and returns the plan's orders.
    pub fn take_orders(&mut self) -> Vec<OrderBy> {
        std::mem::take(&mut self.orders)
    }

    /// Wraps existing `WHERE` and `HAVING` conditions in parentheses when they
    /// contain an `OR`, so conditions appended afterwards constrain all of them.
    pub fn isolate_conditions(&mut self) {
        fn isolate(conditions: &mut Vec<Condition>) {
            if conditions.iter().any(|c| c.connective == Connective::Or) {
                let grouped = std::mem::take(conditions);
                conditions.push(Condition {
                    connective: Connective::And,
                    predicate: Predicate::Group {
                        conditions: grouped,
                    },
                });
            }
        }
        isolate(&mut self.wheres);
        isolate(&mut self.havings);
    }

    /// A read-only copy selecting the distinct values of `expression` as `value`,
    /// keeping joins and filters but not orders or paging.
    #[must_use]
    pub fn distinct_values(&self, expression: &str) -> Self {
        Self {
            distinct: true,
            selects: vec![SelectItem::aliased(expression, "value")],
            orders: Vec::new(),
            limit: None,
            offset: None,
            ..self.clone()
        }
    }

    /// The plan to count rows over: no orders and no paging.
    #[must_use]
    pub fn for_count(&self) -> Self {
        Self {
            orders: Vec::new(),
            limit: None,
            offset: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builder_collects_clauses_in_order() {
        let plan = QueryPlan::table("users u")
            .select("u.id")
            .select_as("CONCAT(u.first, ' ', u.last)", "full_name")
            .left_join("teams", "t", "t.id = u.team_id")
            .where_raw("u.deleted_at IS NULL")
            .order_by("u.id", SortDirection::Desc)
            .limit(10);
        assert_eq!(plan.selects.len(), 2);
        assert_eq!(plan.selects[1].alias.as_deref(), Some("full_name"));
        assert_eq!(plan.joins[0].kind, JoinKind::Left);
        assert_eq!(plan.wheres[0].connective, Connective::And);
        assert_eq!(plan.limit, Some(10));
    }

    #[test]
    fn take_orders_clears_plan() {
        let mut plan = QueryPlan::table("users").order_by("name", SortDirection::Asc);
        let orders = plan.take_orders();
        assert_eq!(orders.len(), 1);
        assert!(plan.orders.is_empty());
    }

    #[test]
    fn distinct_values_leaves_source_untouched() {
        let base = QueryPlan::table("users u")
            .select("u.id")
            .where_raw("u.active = 1")
            .order_by("u.id", SortDirection::Asc)
            .limit(5);
        let distinct = base.distinct_values("u.status");
        assert!(distinct.distinct);
        assert_eq!(distinct.selects, vec![SelectItem::aliased("u.status", "value")]);
        assert_eq!(distinct.wheres, base.wheres);
        assert!(distinct.orders.is_empty());
        assert_eq!(distinct.limit, None);
        assert_eq!(base.selects.len(), 1);
        assert_eq!(base.limit, Some(5));
    }

    #[test]
    fn any_of_joins_with_or() {
        let Predicate::Group { conditions } = Predicate::any_of([
            Predicate::contains_ci("u.name", "Ann"),
            Predicate::contains_ci("u.name", "bob"),
        ]) else {
            panic!("expected a group");
        };
        assert_eq!(conditions[0].connective, Connective::And);
        assert_eq!(conditions[1].connective, Connective::Or);
        assert_eq!(
            conditions[0].predicate,
            Predicate::Like {
                expression: "u.name".to_string(),
                pattern: "%ann%".to_string(),
                negated: false,
                case_insensitive: true,
            }
        );
    }

    #[test]
    fn isolate_conditions_groups_disjunctions_only() {
        let mut plan = QueryPlan::table("users").where_raw("a = 1");
        plan.isolate_conditions();
        assert_eq!(plan.wheres.len(), 1);
        assert!(matches!(plan.wheres[0].predicate, Predicate::Raw { .. }));

        let mut plan = QueryPlan::table("users").where_raw("a = 1").or_where_raw("b = 2");
        plan.isolate_conditions();
        assert_eq!(plan.wheres.len(), 1);
        assert!(matches!(plan.wheres[0].predicate, Predicate::Group { .. }));
    }

    #[test]
    fn compare_carries_value_unrendered() {
        let p = Predicate::compare("u.status", SqlOperator::Eq, json!("1"));
        assert_eq!(
            p,
            Predicate::Compare {
                expression: "u.status".to_string(),
                operator: SqlOperator::Eq,
                value: json!("1"),
            }
        );
    }
}
