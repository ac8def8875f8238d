//! Client for the wger exercise database.
//!
//! The upstream API hands out a short-lived access token and a longer-lived
//! refresh token. This crate keeps that pair alive and walks the paginated
//! listing endpoints on behalf of the caller.
//!
//! - [`TokenAuthenticator`]: owns the credential session and serializes token exchanges
//! - [`WgerClient`]: paginated fetcher that retries a page once after re-authenticating
//! - [`CredentialSource`]: where the upstream username/password come from
//! - [`http`]: shared `reqwest::Client` construction

pub mod auth;
pub mod client;
pub mod credentials;
pub mod error;
pub mod http;
pub mod models;

pub use auth::{AuthConfig, RefreshOutcome, SessionSnapshot, TokenAuthenticator};
pub use client::{DEFAULT_BASE_URL, DEFAULT_LANGUAGE, WgerClient};
pub use credentials::{CredentialSource, Credentials, EnvCredentials, StaticCredentials};
pub use error::{Result, WgerError};
pub use models::{Exercise, ExerciseCategory, ExerciseName, Paginated, UNCATEGORIZED};
