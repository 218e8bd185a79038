//! Renders a [`QueryPlan`] to parameterised SQL.

use std::borrow::Cow;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::plan::{Condition, Connective, JoinKind, Predicate, QueryPlan, SqlOperator};
use crate::types::{value_as_text, Value};

/// SQL flavour to render for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `$n` placeholders. Text comparisons cast the expression to `TEXT` so a
    /// string parameter can be compared against any column type.
    #[default]
    Postgres,
    /// `?` placeholders, no casts.
    Generic,
}

/// SQL text plus the values bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedSql {
    pub sql: String,
    pub params: Vec<Value>,
}

struct Renderer {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
}

impl Renderer {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn bind(&mut self, value: Value) {
        self.params.push(value);
        match self.dialect {
            Dialect::Postgres => {
                let _ = write!(self.sql, "${}", self.params.len());
            }
            Dialect::Generic => self.sql.push('?'),
        }
    }

    fn text_expression(&mut self, expression: &str) {
        match self.dialect {
            Dialect::Postgres => {
                let _ = write!(self.sql, "CAST({expression} AS TEXT)");
            }
            Dialect::Generic => self.sql.push_str(expression),
        }
    }

    fn plan(&mut self, plan: &QueryPlan) {
        self.sql.push_str("SELECT ");
        if plan.distinct {
            self.sql.push_str("DISTINCT ");
        }
        if plan.selects.is_empty() {
            self.sql.push('*');
        }
        for (i, item) in plan.selects.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.sql.push_str(&item.expression);
            if let Some(alias) = &item.alias {
                let _ = write!(self.sql, " AS {alias}");
            }
        }
        let _ = write!(self.sql, " FROM {}", plan.from);
        for join in &plan.joins {
            let kind = match join.kind {
                JoinKind::Left => "LEFT JOIN",
                JoinKind::Inner => "INNER JOIN",
            };
            let _ = write!(self.sql, " {kind} {}", join.table);
            if let Some(alias) = &join.alias {
                let _ = write!(self.sql, " AS {alias}");
            }
            let _ = write!(self.sql, " ON {}", join.on);
        }
        if !plan.wheres.is_empty() {
            self.sql.push_str(" WHERE ");
            self.conditions(&plan.wheres);
        }
        if !plan.group_by.is_empty() {
            let _ = write!(self.sql, " GROUP BY {}", plan.group_by.join(", "));
        }
        if !plan.havings.is_empty() {
            self.sql.push_str(" HAVING ");
            self.conditions(&plan.havings);
        }
        if !plan.orders.is_empty() {
            self.sql.push_str(" ORDER BY ");
            for (i, order) in plan.orders.iter().enumerate() {
                if i > 0 {
                    self.sql.push_str(", ");
                }
                let _ = write!(
                    self.sql,
                    "{} {}",
                    order.expression,
                    order.direction.as_sql()
                );
            }
        }
        if let Some(limit) = plan.limit {
            let _ = write!(self.sql, " LIMIT {limit}");
        }
        if let Some(offset) = plan.offset {
            let _ = write!(self.sql, " OFFSET {offset}");
        }
    }

    fn conditions(&mut self, conditions: &[Condition]) {
        for (i, condition) in conditions.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(match condition.connective {
                    Connective::And => " AND ",
                    Connective::Or => " OR ",
                });
            }
            self.predicate(&condition.predicate);
        }
    }

    fn predicate(&mut self, predicate: &Predicate) {
        match predicate {
            Predicate::Raw { sql } => {
                let _ = write!(self.sql, "({sql})");
            }
            Predicate::Compare {
                expression,
                operator,
                value,
            } => self.compare(expression, *operator, value),
            Predicate::Like {
                expression,
                pattern,
                negated,
                case_insensitive,
            } => {
                if *case_insensitive {
                    self.sql.push_str("LOWER(");
                    self.text_expression(expression);
                    self.sql.push(')');
                } else {
                    self.text_expression(expression);
                }
                self.sql
                    .push_str(if *negated { " NOT LIKE " } else { " LIKE " });
                self.bind(Value::String(pattern.clone()));
            }
            Predicate::IsNull {
                expression,
                negated,
            } => {
                let _ = write!(
                    self.sql,
                    "{expression} IS {}NULL",
                    if *negated { "NOT " } else { "" }
                );
            }
            Predicate::Group { conditions } => {
                if conditions.is_empty() {
                    self.sql.push_str("1 = 1");
                } else {
                    self.sql.push('(');
                    self.conditions(conditions);
                    self.sql.push(')');
                }
            }
        }
    }

    fn compare(&mut self, expression: &str, operator: SqlOperator, value: &Value) {
        let bound = if self.dialect == Dialect::Postgres {
            let text = value_as_text(value).map(Cow::into_owned);
            // Ordering against a numeric-looking value compares numerically;
            // everything else compares as text.
            match text.as_deref().and_then(numeric) {
                Some(number) if operator.is_ordering() => {
                    self.sql.push_str(expression);
                    Value::Number(number)
                }
                _ => {
                    self.text_expression(expression);
                    text.map_or(Value::Null, Value::String)
                }
            }
        } else {
            self.sql.push_str(expression);
            value.clone()
        };
        let _ = write!(self.sql, " {} ", operator.as_sql());
        self.bind(bound);
    }
}

fn numeric(text: &str) -> Option<serde_json::Number> {
    let text = text.trim();
    if let Ok(n) = text.parse::<i64>() {
        return Some(n.into());
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
}

/// Renders the plan as a `SELECT` statement.
#[must_use]
pub fn render(plan: &QueryPlan, dialect: Dialect) -> RenderedSql {
    let mut renderer = Renderer::new(dialect);
    renderer.plan(plan);
    RenderedSql {
        sql: renderer.sql,
        params: renderer.params,
    }
}

/// Renders `SELECT COUNT(*)` over the plan without orders or paging.
#[must_use]
pub fn render_count(plan: &QueryPlan, dialect: Dialect) -> RenderedSql {
    let mut renderer = Renderer::new(dialect);
    renderer.sql.push_str("SELECT COUNT(*) AS aggregate FROM (");
    renderer.plan(&plan.for_count());
    renderer.sql.push_str(") AS grid_count");
    RenderedSql {
        sql: renderer.sql,
        params: renderer.params,
    }
}
