//! Upstream credential sources.

use std::fmt;

use crate::error::{Result, WgerError};

pub const USERNAME_VAR: &str = "WGER_USERNAME";
pub const PASSWORD_VAR: &str = "WGER_PASSWORD";

/// Username/password pair for the credential grant.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Supplies the credential pair each time a full authentication runs.
pub trait CredentialSource: Send + Sync {
    fn credentials(&self) -> Result<Credentials>;
}

/// Reads `WGER_USERNAME` / `WGER_PASSWORD` from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialSource for EnvCredentials {
    fn credentials(&self) -> Result<Credentials> {
        let username = std::env::var(USERNAME_VAR).ok().filter(|v| !v.is_empty());
        let password = std::env::var(PASSWORD_VAR).ok().filter(|v| !v.is_empty());

        match (username, password) {
            (Some(username), Some(password)) => Ok(Credentials { username, password }),
            _ => Err(WgerError::config(format!(
                "{USERNAME_VAR} and {PASSWORD_VAR} must be set"
            ))),
        }
    }
}

/// Fixed credentials, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(Option<Credentials>);

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self(Some(Credentials::new(username, password)))
    }

    /// A source that always reports missing credentials.
    pub fn missing() -> Self {
        Self(None)
    }
}

impl CredentialSource for StaticCredentials {
    fn credentials(&self) -> Result<Credentials> {
        match &self.0 {
            Some(creds) if !creds.username.is_empty() && !creds.password.is_empty() => {
                Ok(creds.clone())
            }
            _ => Err(WgerError::config("upstream username and password are required")),
        }
    }
}
