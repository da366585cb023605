//! User storage abstraction and its implementations.

use async_trait::async_trait;

use roster_core::{NewUser, User, UserId};

use crate::db::StorageError;

mod in_memory;
mod postgres;

pub use in_memory::InMemoryUserRepository;
pub use postgres::PostgresUserRepository;

/// Persistence boundary for users.
///
/// Implementations report failures as [`StorageError`] so callers can
/// classify them without knowing which backend is in use.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users, ordered by id.
    async fn find_all(&self) -> Result<Vec<User>, StorageError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Store a new user. A duplicate email is a unique violation on `email`.
    async fn create(&self, new_user: NewUser) -> Result<User, StorageError>;
}
