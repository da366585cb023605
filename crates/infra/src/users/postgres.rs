use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use roster_core::{NewUser, User, UserId};

use super::UserRepository;
use crate::db::{self, StorageError};

const SELECT_COLUMNS: &str = "id, email, first_name, last_name, created_at";

/// Postgres-backed user store.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table if it is missing.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        db::ensure_schema(&self.pool).await
    }
}

fn user_from_row(row: &PgRow) -> Result<User, StorageError> {
    Ok(User {
        id: UserId::new(row.try_get("id")?),
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self), err)]
    async fn find_all(&self) -> Result<Vec<User>, StorageError> {
        let rows = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, new_user), fields(email = %new_user.email), err)]
    async fn create(&self, new_user: NewUser) -> Result<User, StorageError> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (email, password_hash, first_name, last_name) \
             VALUES ($1, $2, $3, $4) RETURNING {SELECT_COLUMNS}"
        ))
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .fetch_one(&self.pool)
        .await?;
        user_from_row(&row)
    }
}
