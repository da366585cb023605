//! HTTP API application wiring (Axum router + layers).
//!
//! - `routes/`: handlers, one file per area
//! - `services.rs`: what handlers call into
//! - `dto.rs` / `extract.rs`: request bodies and extractors
//! - `errors.rs` / `normalizer.rs`: the error type and its JSON envelope

use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use roster_infra::{AppConfig, UserRepository};

use crate::middleware::{self, RequestLogging};

pub mod dto;
pub mod errors;
pub mod extract;
pub mod normalizer;
pub mod routes;
pub mod services;

/// Build the full HTTP router (used by `main.rs` and the black-box tests).
pub fn build_app(config: &AppConfig, repo: Arc<dyn UserRepository>) -> Router {
    let users = services::UsersService::new(repo);
    let normalizer = normalizer::ErrorNormalizer::from_config(config);
    let logging = RequestLogging::from_config(config);

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/v1", routes::v1())
        .fallback(routes::system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("SAMEORIGIN"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                ))
                .layer(DefaultBodyLimit::max(config.body_limit_bytes))
                .layer(axum::middleware::from_fn_with_state(logging, middleware::log_requests))
                .layer(axum::middleware::from_fn_with_state(
                    normalizer,
                    middleware::normalize_errors,
                ))
                .layer(CatchPanicLayer::custom(middleware::panic_to_error))
                .layer(Extension(users))
                .layer(Extension(routes::system::StartedAt(Instant::now()))),
        )
}
