//! `roster-core`: domain building blocks for the user directory.
//!
//! This crate contains **pure domain** types (no HTTP, no storage).

pub mod entity;
pub mod error;
pub mod id;
pub mod schema;
pub mod user;

pub use entity::Entity;
pub use error::{PathSegment, ValidationError, ValidationIssue};
pub use id::UserId;
pub use schema::Schema;
pub use user::{NewUser, User};
