//! REST API module.
//!
//! Serves the cached exercise-name view, the name lookup, an administrative
//! cache flush and health probes.

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{ApiServer, ApiServerConfig, AppState};
