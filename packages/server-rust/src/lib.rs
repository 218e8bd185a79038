//! `Gridshape` Server: the grid request pipeline, configuration and session
//! stores, attachment URL signing and axum glue.

pub mod error;
pub mod grid;
pub mod network;
pub mod service;
pub mod storage;
pub mod telemetry;
pub mod traits;

pub use error::GridError;
pub use grid::{DataGrid, DataGridBuilder, IconSpec, RowMapper};
pub use network::{layout_routes, GridParams};
pub use service::{GridConfig, GridLayoutService, GridServices};
pub use traits::{AttachmentStorage, ConfigurationGateway, DataSource, SessionStore};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
