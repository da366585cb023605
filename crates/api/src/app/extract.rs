//! Extractors that fail with [`ApiError`].

use axum::extract::{FromRequest, FromRequestParts, Json, Path, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use roster_core::{Schema, UserId};

use crate::app::errors::ApiError;

/// JSON body that has passed its [`Schema`] checks.
///
/// Rejections become malformed-body or validation errors.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Schema,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.check()?;
        Ok(Self(value))
    }
}

/// The `:id` path parameter as a [`UserId`].
#[derive(Debug, Clone, Copy)]
pub struct UserIdParam(pub UserId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for UserIdParam
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::domain(rejection.status(), rejection.body_text()))?;
        Ok(Self(raw.parse()?))
    }
}
