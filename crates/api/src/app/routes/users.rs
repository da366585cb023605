use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use roster_core::User;

use crate::app::dto::CreateUserRequest;
use crate::app::errors::ApiError;
use crate::app::extract::{UserIdParam, ValidatedJson};
use crate::app::routes::system::not_found;
use crate::app::services::UsersService;

pub fn router() -> Router {
    let collection = || get(list_users).post(create_user).fallback(not_found);

    Router::new()
        .route("/users", collection())
        .route("/users/", collection())
        .route("/users/:id", get(get_user).fallback(not_found))
}

pub async fn list_users(Extension(users): Extension<UsersService>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(users.list_users().await?))
}

/// A missing user answers with the bare `{"message": "User not found"}` body
/// instead of the error envelope.
pub async fn get_user(
    Extension(users): Extension<UsersService>,
    UserIdParam(id): UserIdParam,
) -> Result<Response, ApiError> {
    match users.get_user(id).await? {
        Some(user) => Ok(Json(user).into_response()),
        None => Ok((StatusCode::NOT_FOUND, Json(json!({ "message": "User not found" }))).into_response()),
    }
}

pub async fn create_user(
    Extension(users): Extension<UsersService>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = users.create_user(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
