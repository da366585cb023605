use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use roster_core::{Entity, NewUser, User, UserId};

use super::UserRepository;
use crate::db::StorageError;

#[derive(Debug)]
struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    rows: BTreeMap<UserId, StoredUser>,
}

/// In-memory user store for tests/dev.
///
/// Mirrors the Postgres schema: ids start at 1 and emails are unique.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<Inner>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The password hash stored for `id`, if the user exists.
    pub fn password_hash(&self, id: UserId) -> Result<Option<String>, StorageError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.get(&id).map(|row| row.password_hash.clone()))
    }
}

fn poisoned() -> StorageError {
    StorageError::Unclassified("user store lock poisoned".to_string())
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_all(&self) -> Result<Vec<User>, StorageError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.values().map(|row| row.user.clone()).collect())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.get(&id).map(|row| row.user.clone()))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StorageError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;

        if inner.rows.values().any(|row| row.user.email == new_user.email) {
            return Err(StorageError::unique_violation(
                ["email"],
                "Unique constraint failed on the fields: (`email`)",
            ));
        }

        inner.last_id += 1;
        let user = User {
            id: UserId::new(inner.last_id),
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            created_at: Utc::now(),
        };
        inner.rows.insert(
            *user.id(),
            StoredUser {
                user: user.clone(),
                password_hash: new_user.password_hash,
            },
        );
        Ok(user)
    }
}
