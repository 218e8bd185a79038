//! [`DataSource`] serving pre-seeded rows.
//!
//! [`FixtureDataSource`] does not evaluate predicates: every plan sees the same
//! seeded rows, sliced by the plan's offset and limit. Each plan it is asked to
//! run is recorded so tests can assert on the compiled query.

use async_trait::async_trait;
use dashmap::DashMap;
use gridshape_core::{render, Dialect, QueryPlan, RenderedSql, Row, Value};
use parking_lot::Mutex;

use crate::traits::DataSource;

/// Fixture rows plus a log of executed plans.
pub struct FixtureDataSource {
    rows: Vec<Row>,
    distinct: DashMap<String, Vec<Value>>,
    executed: Mutex<Vec<QueryPlan>>,
    failure: Option<String>,
}

impl FixtureDataSource {
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            distinct: DashMap::new(),
            executed: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// Builds a source from JSON objects; non-object values are skipped.
    #[must_use]
    pub fn from_json(rows: impl IntoIterator<Item = Value>) -> Self {
        Self::new(
            rows.into_iter()
                .filter_map(|row| match row {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
        )
    }

    /// A source whose every call fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(Vec::new())
        }
    }

    /// Seeds the values returned for a distinct-values query over `expression`.
    #[must_use]
    pub fn with_distinct(self, expression: impl Into<String>, values: Vec<Value>) -> Self {
        self.distinct.insert(expression.into(), values);
        self
    }

    /// Every plan run so far, in execution order.
    #[must_use]
    pub fn executed(&self) -> Vec<QueryPlan> {
        self.executed.lock().clone()
    }

    /// The most recent plan rendered with `dialect`.
    #[must_use]
    pub fn last_sql(&self, dialect: Dialect) -> Option<RenderedSql> {
        self.executed.lock().last().map(|plan| render(plan, dialect))
    }

    fn check(&self) -> anyhow::Result<()> {
        match &self.failure {
            Some(message) => Err(anyhow::anyhow!("{message}")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataSource for FixtureDataSource {
    async fn fetch(&self, plan: &QueryPlan) -> anyhow::Result<Vec<Row>> {
        self.check()?;
        self.executed.lock().push(plan.clone());

        if plan.distinct {
            if let [item] = plan.selects.as_slice() {
                let values = self
                    .distinct
                    .get(&item.expression)
                    .map(|v| v.clone())
                    .unwrap_or_default();
                return Ok(values
                    .into_iter()
                    .map(|value| {
                        let mut row = Row::new();
                        row.insert("value".to_string(), value);
                        row
                    })
                    .collect());
            }
        }

        let offset = plan
            .offset
            .and_then(|o| usize::try_from(o).ok())
            .unwrap_or(0);
        let limit = plan
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);
        Ok(self.rows.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count(&self, _plan: &QueryPlan) -> anyhow::Result<u64> {
        self.check()?;
        Ok(self.rows.len() as u64)
    }
}
