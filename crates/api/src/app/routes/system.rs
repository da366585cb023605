use std::time::Instant;

use axum::extract::{Extension, OriginalUri};
use axum::http::StatusCode;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::app::errors::ApiError;

/// When the process started serving, for `uptime`.
#[derive(Debug, Clone, Copy)]
pub struct StartedAt(pub Instant);

#[derive(Debug, Serialize)]
pub struct Health {
    status: &'static str,
    timestamp: String,
    /// Seconds.
    uptime: f64,
}

pub async fn health(Extension(StartedAt(started)): Extension<StartedAt>) -> Json<Health> {
    Json(Health {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: started.elapsed().as_secs_f64(),
    })
}

/// Fallback for unknown routes and unsupported methods.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    let url = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    ApiError::domain(StatusCode::NOT_FOUND, format!("Route {url} not found"))
}
