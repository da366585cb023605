//! Application services: what the handlers call.

use std::sync::Arc;

use anyhow::Context as _;
use tracing::instrument;

use roster_core::{NewUser, User, UserId};
use roster_infra::password::hash_password;
use roster_infra::UserRepository;

use crate::app::dto::CreateUserRequest;
use crate::app::errors::ApiError;

/// User operations over an injected repository.
#[derive(Clone)]
pub struct UsersService {
    repo: Arc<dyn UserRepository>,
}

impl UsersService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.repo.find_all().await?)
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, ApiError> {
        Ok(self.repo.find_by_id(id).await?)
    }

    /// Hash the password off the async runtime and store the user.
    ///
    /// The request must already be validated.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn create_user(&self, req: CreateUserRequest) -> Result<User, ApiError> {
        let CreateUserRequest {
            email,
            password,
            first_name,
            last_name,
        } = req;

        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("password hashing task failed")?
            .context("could not hash password")?;

        let user = self
            .repo
            .create(NewUser {
                email,
                password_hash,
                first_name,
                last_name,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use roster_infra::{InMemoryUserRepository, StorageError, VendorCode};

    use super::*;

    fn service() -> UsersService {
        UsersService::new(Arc::new(InMemoryUserRepository::new()))
    }

    fn request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.into(),
            password: "analytical".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        }
    }

    #[tokio::test]
    async fn create_then_fetch() {
        let svc = service();
        let created = svc.create_user(request("ada@example.com")).await.unwrap();

        assert_eq!(svc.get_user(created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(svc.list_users().await.unwrap(), vec![created]);
        assert_eq!(svc.get_user(UserId::new(42)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn stores_an_argon2_hash_not_the_plaintext() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let svc = UsersService::new(repo.clone());
        let created = svc.create_user(request("ada@example.com")).await.unwrap();

        let stored = repo.password_hash(created.id).unwrap().unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(!stored.contains("analytical"));
    }

    #[tokio::test]
    async fn duplicate_email_surfaces_as_storage_error() {
        let svc = service();
        svc.create_user(request("ada@example.com")).await.unwrap();

        let err = svc.create_user(request("ada@example.com")).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Storage(StorageError::Known { code: VendorCode::UniqueViolation { .. }, .. })
        ));
    }
}
