use std::time::Duration;

use async_trait::async_trait;
use gridshape_core::{ConfigField, ConfigKey, ConfigRecord, QueryPlan, Row, SessionState, Value};

/// Executes query plans against the underlying database.
/// Implementations: `PostgreSQL` (feature `postgres`), fixtures (tests).
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Run the plan and return one JSON object per result row, keyed by
    /// output alias.
    async fn fetch(&self, plan: &QueryPlan) -> anyhow::Result<Vec<Row>>;

    /// Count the rows the plan would return without orders or paging.
    async fn count(&self, plan: &QueryPlan) -> anyhow::Result<u64>;

    /// Eager-load named relationships onto fetched rows.
    /// The default implementation loads nothing.
    async fn load_relationships(
        &self,
        _rows: &mut [Row],
        _relationships: &[String],
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Persisted per-grid configuration, keyed by grid reference and identity.
/// Last writer wins; no concurrency token is involved.
#[async_trait]
pub trait ConfigurationGateway: Send + Sync {
    async fn has_configuration(&self, key: &ConfigKey) -> anyhow::Result<bool>;

    /// Load the record for `key`.
    async fn get_configuration(&self, key: &ConfigKey) -> anyhow::Result<ConfigRecord>;

    /// Store `record` for `key`, replacing any existing one, and return what
    /// was stored.
    async fn set_configuration(
        &self,
        key: &ConfigKey,
        record: ConfigRecord,
    ) -> anyhow::Result<ConfigRecord>;

    /// Replace a single top-level field of the stored record.
    async fn update_configuration_value(
        &self,
        key: &ConfigKey,
        field: ConfigField,
        value: Value,
    ) -> anyhow::Result<()>;
}

/// Session-scoped grid state, for grids that read state from the session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &ConfigKey) -> anyhow::Result<Option<SessionState>>;

    async fn put(&self, key: &ConfigKey, state: SessionState) -> anyhow::Result<()>;
}

/// Resolves attachment files to URLs a browser can load.
#[async_trait]
pub trait AttachmentStorage: Send + Sync {
    /// Time-limited URL for `key` on `disk`, valid for `validity`.
    async fn resolve_url(
        &self,
        disk: &str,
        key: &str,
        base_url: Option<&str>,
        validity: Duration,
    ) -> anyhow::Result<String>;
}
