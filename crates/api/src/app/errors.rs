//! The error type every handler returns.
//!
//! Handlers never build error bodies. They return [`ApiError`], which parks
//! itself in the response extensions; `middleware::normalize_errors` turns it
//! into the JSON envelope once the request context is known.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use thiserror::Error;

use roster_core::ValidationError;
use roster_infra::StorageError;

/// Why a bearer token was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is invalid")]
    Invalid,
    #[error("token has expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            JwtErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        }
    }
}

/// Everything that can go wrong while handling a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An expected failure with a status chosen by the caller.
    #[error("{message}")]
    Domain { status: StatusCode, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Token(#[from] TokenError),

    /// The request body was not parseable JSON.
    ///
    /// The parser's text only shows up in the development `stack`; clients
    /// always get the generic message.
    #[error("malformed JSON body: {0}")]
    MalformedBody(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn domain(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Domain {
            status,
            message: message.into(),
        }
    }

    /// Short name of the variant, used as the head of the trace text.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Domain { .. } => "DomainError",
            ApiError::Validation(_) => "ValidationError",
            ApiError::Storage(_) => "StorageError",
            ApiError::Token(_) => "TokenError",
            ApiError::MalformedBody(_) => "MalformedBodyError",
            ApiError::Internal(_) => "InternalError",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Token(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonSyntaxError(err) => Self::MalformedBody(err.body_text()),
            JsonRejection::JsonDataError(err) => {
                Self::Validation(ValidationError::single(["body"], err.body_text()))
            }
            other => Self::domain(other.status(), other.body_text()),
        }
    }
}

/// An [`ApiError`] waiting in the response extensions for the normalizer.
#[derive(Debug, Clone)]
pub struct PendingError(pub Arc<ApiError>);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response
            .extensions_mut()
            .insert(PendingError(Arc::new(self)));
        response
    }
}
