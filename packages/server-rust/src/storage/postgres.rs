//! `PostgreSQL` collaborators on `sqlx`.
//!
//! [`PgDataSource`] renders plans with [`Dialect::Postgres`] and wraps them in
//! `row_to_json` so each row arrives as a JSON object keyed by output alias.
//! [`PgConfigurationStore`] keeps one JSONB document per grid reference and
//! identity in `grid_configurations`.

use async_trait::async_trait;
use gridshape_core::{
    render, render_count, ConfigField, ConfigKey, ConfigRecord, Dialect, QueryPlan, Row, Value,
};
use sqlx::postgres::{PgArguments, PgPool};
use sqlx::query::QueryScalar;
use sqlx::types::Json;
use sqlx::Postgres;

use crate::traits::{ConfigurationGateway, DataSource};

fn bind_param<'q, O>(
    query: QueryScalar<'q, Postgres, O, PgArguments>,
    value: &Value,
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(Json(other.clone())),
    }
}

/// Data source executing plans on a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgDataSource {
    pool: PgPool,
}

impl PgDataSource {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataSource for PgDataSource {
    async fn fetch(&self, plan: &QueryPlan) -> anyhow::Result<Vec<Row>> {
        let rendered = render(plan, Dialect::Postgres);
        let sql = format!(
            "SELECT row_to_json(grid_row) FROM ({}) AS grid_row",
            rendered.sql
        );
        let mut query = sqlx::query_scalar::<_, Json<Value>>(&sql);
        for param in &rendered.params {
            query = bind_param(query, param);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .filter_map(|Json(row)| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }

    async fn count(&self, plan: &QueryPlan) -> anyhow::Result<u64> {
        let rendered = render_count(plan, Dialect::Postgres);
        let mut query = sqlx::query_scalar::<_, i64>(&rendered.sql);
        for param in &rendered.params {
            query = bind_param(query, param);
        }
        let count = query.fetch_one(&self.pool).await?;
        Ok(u64::try_from(count)?)
    }
}

/// Grid configuration stored as JSONB documents.
#[derive(Clone)]
pub struct PgConfigurationStore {
    pool: PgPool,
}

impl PgConfigurationStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `grid_configurations` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS grid_configurations (
                table_ref TEXT NOT NULL,
                identity TEXT NOT NULL,
                data JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (table_ref, identity)
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Anonymous access is stored under the empty identity.
fn identity(key: &ConfigKey) -> &str {
    key.identity.as_deref().unwrap_or("")
}

#[async_trait]
impl ConfigurationGateway for PgConfigurationStore {
    async fn has_configuration(&self, key: &ConfigKey) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM grid_configurations WHERE table_ref = $1 AND identity = $2)",
        )
        .bind(&key.table_ref)
        .bind(identity(key))
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn get_configuration(&self, key: &ConfigKey) -> anyhow::Result<ConfigRecord> {
        let Json(record) = sqlx::query_scalar::<_, Json<ConfigRecord>>(
            "SELECT data FROM grid_configurations WHERE table_ref = $1 AND identity = $2",
        )
        .bind(&key.table_ref)
        .bind(identity(key))
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn set_configuration(
        &self,
        key: &ConfigKey,
        record: ConfigRecord,
    ) -> anyhow::Result<ConfigRecord> {
        let Json(stored) = sqlx::query_scalar::<_, Json<ConfigRecord>>(
            "INSERT INTO grid_configurations (table_ref, identity, data)
             VALUES ($1, $2, $3)
             ON CONFLICT (table_ref, identity)
             DO UPDATE SET data = EXCLUDED.data, updated_at = now()
             RETURNING data",
        )
        .bind(&key.table_ref)
        .bind(identity(key))
        .bind(Json(&record))
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn update_configuration_value(
        &self,
        key: &ConfigKey,
        field: ConfigField,
        value: Value,
    ) -> anyhow::Result<()> {
        let updated = sqlx::query(
            "UPDATE grid_configurations
             SET data = jsonb_set(data, ARRAY[$3::text], $4, true), updated_at = now()
             WHERE table_ref = $1 AND identity = $2",
        )
        .bind(&key.table_ref)
        .bind(identity(key))
        .bind(field.as_str())
        .bind(Json(&value))
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            let mut record = ConfigRecord::new(key.table_ref.clone());
            record.apply(field, value)?;
            self.set_configuration(key, record).await?;
        }
        Ok(())
    }
}
