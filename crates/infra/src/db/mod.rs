//! Database adapters (connection pool, schema bootstrap, error mapping).

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, instrument};

mod error;

pub use error::{StorageError, VendorCode, classify_sqlstate, key_columns};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Schema for the `users` table. Every statement is idempotent.
pub const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// Open a Postgres connection pool.
///
/// A failed connection attempt is reported as [`StorageError::Connection`].
#[instrument(skip(database_url), err)]
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StorageError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
        .map_err(|e| match StorageError::from(e) {
            StorageError::Connection(msg) => StorageError::Connection(msg),
            other => StorageError::Connection(other.to_string()),
        })?;

    info!(max_connections, "database pool ready");
    Ok(pool)
}

/// Create the tables this service needs if they do not exist yet.
#[instrument(skip(pool), err)]
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}
