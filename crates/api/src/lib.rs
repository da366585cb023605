//! HTTP API: server, routing, error normalization and request logging.

pub mod app;
pub mod context;
pub mod middleware;
pub mod server;
