use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("navigation failed: {0}")]
    Navigation(#[from] NavError),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a page navigator or one of its browsing contexts.
#[derive(Debug, Error)]
pub enum NavError {
    /// The navigation engine could not be started or has gone away.
    #[error("navigator unavailable: {0}")]
    Unavailable(String),

    #[error("navigator not started")]
    NotStarted,

    #[error("timed out loading {0}")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl NavError {
    /// Whether this error means the navigation engine itself is unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::NotStarted)
    }
}
