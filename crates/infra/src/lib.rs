//! Infrastructure layer: configuration, Postgres pool, catalog storage.

pub mod config;
pub mod db;
pub mod store;

pub use config::{AppConfig, ConfigError, DatabaseConfig, ServerConfig};
pub use store::{InMemoryLibraryStore, LibraryStore, PostgresLibraryStore, StoreError, StoreResult};
