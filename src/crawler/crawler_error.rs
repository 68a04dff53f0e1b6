use thiserror::Error;

/// Why one fetch attempt for one page did not yield a usable page.
/// The scheduler retries all of these the same way.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("No listing container found in page")]
    Invalid,

    #[error("Client config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}
