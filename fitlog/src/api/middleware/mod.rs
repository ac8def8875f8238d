//! API middleware.

pub mod auth;

pub use auth::{ApiKeyAuth, ApiKeyAuthLayer};
