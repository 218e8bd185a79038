//! Shared grid services and layout management.
//!
//! [`GridServices`] bundles the collaborators every grid request needs, so a
//! single clone can be handed to axum as router state.

pub mod config;
pub mod layouts;

pub use config::GridConfig;
pub use layouts::GridLayoutService;

use std::sync::Arc;

use gridshape_core::{ConfigKey, ConfigRecord};

use crate::traits::{AttachmentStorage, ConfigurationGateway, DataSource, SessionStore};

/// Collaborators used to build and serve grids.
///
/// Holds `Arc` references so cloning is cheap.
#[derive(Clone)]
pub struct GridServices {
    pub data: Arc<dyn DataSource>,
    pub configuration: Arc<dyn ConfigurationGateway>,
    pub sessions: Arc<dyn SessionStore>,
    pub attachments: Arc<dyn AttachmentStorage>,
    pub config: Arc<GridConfig>,
}

impl GridServices {
    #[must_use]
    pub fn new(
        data: Arc<dyn DataSource>,
        configuration: Arc<dyn ConfigurationGateway>,
        sessions: Arc<dyn SessionStore>,
        attachments: Arc<dyn AttachmentStorage>,
    ) -> Self {
        Self {
            data,
            configuration,
            sessions,
            attachments,
            config: Arc::new(GridConfig::default()),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: GridConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Layout management bound to this service set's configuration store.
    #[must_use]
    pub fn layouts(&self) -> GridLayoutService {
        GridLayoutService::new(Arc::clone(&self.configuration))
    }
}

/// Returns the stored configuration for `key`, creating the default record
/// first if none exists.
///
/// # Errors
///
/// Propagates gateway failures.
pub async fn load_configuration(
    gateway: &dyn ConfigurationGateway,
    key: &ConfigKey,
) -> anyhow::Result<ConfigRecord> {
    if gateway.has_configuration(key).await? {
        gateway.get_configuration(key).await
    } else {
        tracing::debug!(table_ref = %key.table_ref, "creating default grid configuration");
        gateway
            .set_configuration(key, ConfigRecord::new(key.table_ref.clone()))
            .await
    }
}
