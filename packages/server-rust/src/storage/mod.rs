//! Collaborator implementations: in-memory stores, a fixture data source,
//! signed attachment URLs and, behind the `postgres` feature, `PostgreSQL`.

pub mod attachments;
pub mod fixture;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use attachments::SignedUrlStorage;
pub use fixture::FixtureDataSource;
pub use memory::{MemoryConfigurationStore, MemorySessionStore};
#[cfg(feature = "postgres")]
pub use postgres::{PgConfigurationStore, PgDataSource};
