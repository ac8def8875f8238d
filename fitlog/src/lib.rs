//! fitlog server library crate.
//!
//! Exposes the service wiring for the binary and for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod exercises;
pub mod logging;

pub use error::{Error, Result};
