// src/error.rs
use thiserror::Error;

/// Failure talking to an external data provider. Never escapes the
/// market layer: callers turn it into fallback data or a skipped symbol.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure. The URL is stripped because it carries the API key.
    #[error("request failed: {0}")]
    Http(reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("provider rejected request: {0}")]
    Rejected(String),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("bad endpoint: {0}")]
    Endpoint(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Http(err.without_url())
    }
}
