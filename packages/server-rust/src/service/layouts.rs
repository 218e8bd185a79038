//! Saving, selecting and deleting user layouts.

use std::sync::Arc;

use gridshape_core::layout::{CUSTOM_LAYOUT_PREFIX, PREDEFINED_LAYOUT_PREFIX};
use gridshape_core::{ConfigField, ConfigKey, ConfigRecord, LayoutDefinition, Value};

use super::load_configuration;
use crate::error::GridError;
use crate::traits::ConfigurationGateway;

/// Layout management for one configuration store.
///
/// Every operation reads the current record, changes it and writes the
/// affected field back. Concurrent edits for the same key are last writer wins.
#[derive(Clone)]
pub struct GridLayoutService {
    gateway: Arc<dyn ConfigurationGateway>,
}

impl GridLayoutService {
    #[must_use]
    pub fn new(gateway: Arc<dyn ConfigurationGateway>) -> Self {
        Self { gateway }
    }

    /// Stores `layout` as a custom layout under a fresh `custom_<uuid>` id,
    /// optionally making it the current layout.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Execution`] if the store fails.
    pub async fn save_layout(
        &self,
        key: &ConfigKey,
        mut layout: LayoutDefinition,
        select: bool,
    ) -> Result<LayoutDefinition, GridError> {
        let mut record = load_configuration(self.gateway.as_ref(), key).await?;
        layout.id = format!("{CUSTOM_LAYOUT_PREFIX}_{}", uuid::Uuid::new_v4());
        layout.custom = true;
        layout.default = false;
        layout.current = select;
        if select {
            for existing in &mut record.layouts {
                existing.current = false;
            }
        }
        record.layouts.push(layout.clone());
        self.write_layouts(key, &record).await?;
        if select {
            self.write_current(key, Some(&layout.id)).await?;
        }
        tracing::debug!(table_ref = %key.table_ref, id = %layout.id, "saved custom layout");
        Ok(layout)
    }

    /// Makes `id` the current layout.
    ///
    /// Predefined ids are accepted as-is since predefined layouts live in code;
    /// custom ids must exist in the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::UnknownLayout`] for an unknown custom id.
    pub async fn select_layout(&self, key: &ConfigKey, id: &str) -> Result<(), GridError> {
        let record = load_configuration(self.gateway.as_ref(), key).await?;
        let predefined = id
            .strip_prefix(PREDEFINED_LAYOUT_PREFIX)
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|index| index.parse::<usize>().is_ok());
        if !predefined && !record.layouts.iter().any(|l| l.id == id) {
            return Err(GridError::UnknownLayout { id: id.to_string() });
        }
        self.write_current(key, Some(id)).await
    }

    /// Removes a custom layout, clearing the current selection if it pointed
    /// at the removed one.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::UnknownLayout`] if no custom layout has that id.
    pub async fn delete_layout(&self, key: &ConfigKey, id: &str) -> Result<(), GridError> {
        let mut record = load_configuration(self.gateway.as_ref(), key).await?;
        let before = record.layouts.len();
        record.layouts.retain(|l| l.id != id);
        if record.layouts.len() == before {
            return Err(GridError::UnknownLayout { id: id.to_string() });
        }
        self.write_layouts(key, &record).await?;
        if record.current_layout.as_deref() == Some(id) {
            self.write_current(key, None).await?;
        }
        Ok(())
    }

    /// Clears the current layout selection.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Execution`] if the store fails.
    pub async fn reset_layout(&self, key: &ConfigKey) -> Result<(), GridError> {
        load_configuration(self.gateway.as_ref(), key).await?;
        self.write_current(key, None).await
    }

    async fn write_layouts(&self, key: &ConfigKey, record: &ConfigRecord) -> Result<(), GridError> {
        let layouts = serde_json::to_value(&record.layouts).map_err(anyhow::Error::from)?;
        self.gateway
            .update_configuration_value(key, ConfigField::Layouts, layouts)
            .await?;
        Ok(())
    }

    async fn write_current(&self, key: &ConfigKey, id: Option<&str>) -> Result<(), GridError> {
        let value = id.map_or(Value::Null, |id| Value::String(id.to_string()));
        self.gateway
            .update_configuration_value(key, ConfigField::CurrentLayout, value)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryConfigurationStore;

    fn setup() -> (Arc<MemoryConfigurationStore>, GridLayoutService, ConfigKey) {
        let store = Arc::new(MemoryConfigurationStore::new());
        let service = GridLayoutService::new(store.clone());
        let key = ConfigKey {
            table_ref: "admin/users".to_string(),
            identity: Some("1".to_string()),
        };
        (store, service, key)
    }

    #[tokio::test]
    async fn save_assigns_custom_id_and_selects() {
        let (store, service, key) = setup();
        let saved = service
            .save_layout(&key, LayoutDefinition::builder("Mine").column("name").build(), true)
            .await
            .unwrap();
        assert!(saved.id.starts_with("custom_"));
        assert!(saved.custom);

        let record = store.get_configuration(&key).await.unwrap();
        assert_eq!(record.layouts.len(), 1);
        assert_eq!(record.current_layout.as_deref(), Some(saved.id.as_str()));
    }

    #[tokio::test]
    async fn select_accepts_predefined_and_known_custom_ids() {
        let (store, service, key) = setup();
        service.select_layout(&key, "predefined_2").await.unwrap();
        assert_eq!(
            store.get_configuration(&key).await.unwrap().current_layout.as_deref(),
            Some("predefined_2")
        );

        let err = service.select_layout(&key, "custom_missing").await.unwrap_err();
        assert!(matches!(err, GridError::UnknownLayout { ref id } if id == "custom_missing"));
        let err = service.select_layout(&key, "predefined_x").await.unwrap_err();
        assert!(matches!(err, GridError::UnknownLayout { .. }));
    }

    #[tokio::test]
    async fn delete_clears_current_selection() {
        let (store, service, key) = setup();
        let saved = service
            .save_layout(&key, LayoutDefinition::builder("Mine").build(), true)
            .await
            .unwrap();
        service.delete_layout(&key, &saved.id).await.unwrap();

        let record = store.get_configuration(&key).await.unwrap();
        assert!(record.layouts.is_empty());
        assert!(record.current_layout.is_none());

        let err = service.delete_layout(&key, &saved.id).await.unwrap_err();
        assert!(matches!(err, GridError::UnknownLayout { .. }));
    }

    #[tokio::test]
    async fn reset_clears_selection_but_keeps_layouts() {
        let (store, service, key) = setup();
        service
            .save_layout(&key, LayoutDefinition::builder("Mine").build(), true)
            .await
            .unwrap();
        service.reset_layout(&key).await.unwrap();

        let record = store.get_configuration(&key).await.unwrap();
        assert_eq!(record.layouts.len(), 1);
        assert!(record.current_layout.is_none());
    }
}
