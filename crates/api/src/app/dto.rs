//! Request DTOs.

use serde::Deserialize;
use validator::Validate;

use roster_core::Schema;

/// Body of `POST /api/v1/users`.
///
/// Missing fields default to empty strings so they surface as per-field
/// validation issues rather than a single deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 2, message = "First name must be at least 2 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, message = "Last name must be at least 2 characters"))]
    pub last_name: String,
}

impl Schema for CreateUserRequest {
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("email", "email"),
        ("password", "password"),
        ("first_name", "firstName"),
        ("last_name", "lastName"),
    ];
}
