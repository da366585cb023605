//! Error classification and the JSON error envelope.
//!
//! Every failed request ends up here exactly once. [`ErrorNormalizer::classify`]
//! maps an [`ApiError`] to a [`ClassifiedError`]; [`ErrorNormalizer::respond`]
//! logs it when required and renders the envelope:
//!
//! ```json
//! { "status": "error", "statusCode": 400, "message": "Validation failed",
//!   "errors": [{ "field": "email", "message": "Invalid email address" }] }
//! ```
//!
//! `errors` is present only for validation failures and `stack` only in
//! development mode.

use std::error::Error as _;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use roster_infra::{AppConfig, ExecutionMode, StorageError, VendorCode};

use crate::app::errors::{ApiError, TokenError};
use crate::context::RequestContext;

pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// One invalid field in a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// The outcome of classifying an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub status: StatusCode,
    pub message: String,
    pub field_errors: Vec<FieldError>,
    /// Expected failure (bad input, conflicts) as opposed to a bug or outage.
    pub is_operational: bool,
    pub should_log_verbose: bool,
}

/// Response body of every normalized error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

struct Classification {
    status: StatusCode,
    message: String,
    field_errors: Vec<FieldError>,
    is_operational: bool,
}

impl Classification {
    fn operational(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            field_errors: Vec::new(),
            is_operational: true,
        }
    }

    fn unclassified() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: INTERNAL_SERVER_ERROR.to_string(),
            field_errors: Vec::new(),
            is_operational: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorNormalizer {
    mode: ExecutionMode,
}

impl ErrorNormalizer {
    pub fn new(mode: ExecutionMode) -> Self {
        Self { mode }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.mode)
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn classify(&self, err: &ApiError) -> ClassifiedError {
        let c = classify(err);
        ClassifiedError {
            should_log_verbose: self.mode.is_development() || !c.is_operational,
            status: c.status,
            message: c.message,
            field_errors: c.field_errors,
            is_operational: c.is_operational,
        }
    }

    /// Build the envelope for an already classified error.
    pub fn envelope(&self, err: &ApiError, classified: &ClassifiedError) -> ErrorEnvelope {
        ErrorEnvelope {
            status: "error",
            status_code: classified.status.as_u16(),
            message: classified.message.clone(),
            errors: (!classified.field_errors.is_empty()).then(|| classified.field_errors.clone()),
            stack: self.mode.is_development().then(|| trace_text(err)),
        }
    }

    /// Classify, log if needed, and render the final response.
    pub fn respond(&self, err: &ApiError, ctx: &RequestContext) -> Response {
        let classified = self.classify(err);

        if classified.should_log_verbose {
            log_error(err, &classified, ctx);
        }

        let body = self.envelope(err, &classified);
        (classified.status, Json(body)).into_response()
    }
}

fn log_error(err: &ApiError, classified: &ClassifiedError, ctx: &RequestContext) {
    let field_errors = (!classified.field_errors.is_empty())
        .then(|| serde_json::to_string(&classified.field_errors).ok())
        .flatten();

    tracing::error!(
        target: "roster::errors",
        error = %err,
        stack = %trace_text(err),
        status_code = classified.status.as_u16(),
        path = ctx.path(),
        method = %ctx.method(),
        errors = field_errors.as_deref(),
        "request failed"
    );
}

// First match wins.
fn classify(err: &ApiError) -> Classification {
    match err {
        ApiError::Domain { status, message } => Classification::operational(*status, message.clone()),
        ApiError::Validation(validation) => Classification {
            field_errors: validation
                .issues()
                .iter()
                .map(|issue| FieldError {
                    field: issue.field(),
                    message: issue.message.clone(),
                })
                .collect(),
            ..Classification::operational(StatusCode::BAD_REQUEST, "Validation failed")
        },
        ApiError::Storage(storage) => classify_storage(storage),
        ApiError::Token(TokenError::Invalid) => {
            Classification::operational(StatusCode::UNAUTHORIZED, "Invalid token")
        }
        ApiError::Token(TokenError::Expired) => {
            Classification::operational(StatusCode::UNAUTHORIZED, "Token expired")
        }
        ApiError::MalformedBody(_) => {
            Classification::operational(StatusCode::BAD_REQUEST, "Invalid JSON payload")
        }
        ApiError::Internal(_) => Classification::unclassified(),
    }
}

fn classify_storage(err: &StorageError) -> Classification {
    match err {
        StorageError::Known { code, message } => match code {
            VendorCode::UniqueViolation { fields } => Classification::operational(
                StatusCode::CONFLICT,
                format!("Duplicate value for {}", fields.join(", ")),
            ),
            VendorCode::RecordNotFound => {
                Classification::operational(StatusCode::NOT_FOUND, "Record not found")
            }
            VendorCode::ForeignKeyViolation => Classification::operational(
                StatusCode::BAD_REQUEST,
                "Invalid reference to related record",
            ),
            VendorCode::InvalidRelation => {
                Classification::operational(StatusCode::BAD_REQUEST, "Invalid relation in query")
            }
            VendorCode::Other(_) if message.trim().is_empty() => {
                Classification::operational(StatusCode::BAD_REQUEST, "Database operation failed")
            }
            VendorCode::Other(_) => Classification::operational(StatusCode::BAD_REQUEST, message.clone()),
        },
        StorageError::InvalidData(_) => {
            Classification::operational(StatusCode::BAD_REQUEST, "Invalid data provided")
        }
        StorageError::Connection(_) => Classification::operational(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Database connection failed",
        ),
        StorageError::Unclassified(_) => Classification::unclassified(),
    }
}

/// Diagnostic rendering of an error with its whole cause chain. Never empty.
pub fn trace_text(err: &ApiError) -> String {
    let text = match err {
        ApiError::Internal(inner) => format!("{inner:?}"),
        other => {
            let mut text = format!("{}: {}", other.kind(), other);
            let mut source = other.source();
            while let Some(cause) = source {
                text.push_str("\n    caused by: ");
                text.push_str(&cause.to_string());
                source = cause.source();
            }
            text
        }
    };

    if text.trim().is_empty() {
        err.kind().to_string()
    } else {
        text
    }
}
