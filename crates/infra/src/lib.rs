//! Infrastructure layer: configuration, database, user storage, hashing.

pub mod config;
pub mod db;
pub mod password;
pub mod users;

pub use config::{AppConfig, ConfigError, ExecutionMode};
pub use db::{StorageError, VendorCode};
pub use users::{InMemoryUserRepository, PostgresUserRepository, UserRepository};
