use thiserror::Error;

pub type Result<T> = std::result::Result<T, FirecrawlError>;

#[derive(Debug, Error)]
pub enum FirecrawlError {
    #[error("Insufficient credits")]
    InsufficientCredits,

    #[error("Rate limited")]
    RateLimited,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl FirecrawlError {
    /// Map a non-2xx status to the matching kind.
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            402 => FirecrawlError::InsufficientCredits,
            429 => FirecrawlError::RateLimited,
            _ => FirecrawlError::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for FirecrawlError {
    fn from(err: reqwest::Error) -> Self {
        FirecrawlError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for FirecrawlError {
    fn from(err: serde_json::Error) -> Self {
        FirecrawlError::Parse(err.to_string())
    }
}
