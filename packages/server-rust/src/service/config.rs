use std::time::Duration;

use gridshape_core::column::DEFAULT_TIMESTAMP_FORMAT;
use gridshape_core::state::DEFAULT_ITEMS_PER_PAGE;
use gridshape_core::Dialect;

/// Server-level settings shared by every grid.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Page size when the request and session carry none.
    pub default_items_per_page: i64,
    /// Lifetime of signed avatar URLs.
    pub avatar_url_validity: Duration,
    /// Table holding attachment metadata, joined for avatar columns.
    pub attachment_table: String,
    /// Disk whose files are served directly from `base_url/key` without signing.
    pub object_storage_disk: String,
    /// SQL flavour data sources render plans for.
    pub dialect: Dialect,
    /// Display format given to timestamp columns that declare none.
    pub timestamp_format: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            default_items_per_page: DEFAULT_ITEMS_PER_PAGE,
            avatar_url_validity: Duration::from_secs(30 * 60),
            attachment_table: "file".to_string(),
            object_storage_disk: "s3".to_string(),
            dialect: Dialect::Postgres,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}
