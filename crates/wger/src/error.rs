use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WgerError>;

#[derive(Debug, Error)]
pub enum WgerError {
    /// Upstream credentials are missing from the process configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The token endpoint rejected the credentials or refresh token.
    #[error("authentication failed: {status}")]
    Authentication { status: StatusCode },

    /// A listing request came back with a non-success status.
    #[error("API request failed: {status} ({url})")]
    Upstream { status: StatusCode, url: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl WgerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// HTTP status attached to the error, if the upstream produced one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Authentication { status } | Self::Upstream { status, .. } => Some(*status),
            Self::Network(e) => e.status(),
            _ => None,
        }
    }
}
