use axum::Router;

pub mod system;
pub mod users;

/// Router for everything under `/api/v1`.
pub fn v1() -> Router {
    Router::new().merge(users::router())
}
