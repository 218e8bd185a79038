//! In-memory [`ConfigurationGateway`] and [`SessionStore`] backed by [`DashMap`].
//!
//! Suitable for development, tests and single-process deployments where
//! configuration does not need to survive a restart.

use async_trait::async_trait;
use dashmap::DashMap;
use gridshape_core::{ConfigField, ConfigKey, ConfigRecord, SessionState, Value};

use crate::traits::{ConfigurationGateway, SessionStore};

/// Grid configuration records keyed by reference and identity.
pub struct MemoryConfigurationStore {
    records: DashMap<ConfigKey, ConfigRecord>,
}

impl MemoryConfigurationStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for MemoryConfigurationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigurationGateway for MemoryConfigurationStore {
    async fn has_configuration(&self, key: &ConfigKey) -> anyhow::Result<bool> {
        Ok(self.records.contains_key(key))
    }

    async fn get_configuration(&self, key: &ConfigKey) -> anyhow::Result<ConfigRecord> {
        self.records
            .get(key)
            .map(|r| r.clone())
            .ok_or_else(|| anyhow::anyhow!("no grid configuration for {}", key.table_ref))
    }

    async fn set_configuration(
        &self,
        key: &ConfigKey,
        record: ConfigRecord,
    ) -> anyhow::Result<ConfigRecord> {
        self.records.insert(key.clone(), record.clone());
        Ok(record)
    }

    async fn update_configuration_value(
        &self,
        key: &ConfigKey,
        field: ConfigField,
        value: Value,
    ) -> anyhow::Result<()> {
        let mut record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| ConfigRecord::new(key.table_ref.clone()));
        record.apply(field, value)?;
        Ok(())
    }
}

/// Session grid state keyed by reference and identity.
pub struct MemorySessionStore {
    sessions: DashMap<ConfigKey, SessionState>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &ConfigKey) -> anyhow::Result<Option<SessionState>> {
        Ok(self.sessions.get(key).map(|s| s.clone()))
    }

    async fn put(&self, key: &ConfigKey, state: SessionState) -> anyhow::Result<()> {
        self.sessions.insert(key.clone(), state);
        Ok(())
    }
}
