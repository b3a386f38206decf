use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Missing required credential field: {0}")]
    MissingField(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Channel access denied: {0}")]
    Access(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, WatchError>;

/// How the reconnection loop should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Missing or invalid configuration; surfaced before streaming starts.
    Config,
    /// Credentials rejected; terminate, no retry.
    Auth,
    /// Channel forbidden or unknown; terminate, no retry.
    Access,
    /// Timeout, 5xx, malformed payload; retry with exponential backoff.
    Transient,
    /// Anything uncategorized; retry after a fixed delay, backoff untouched.
    Unknown,
}

impl FailureKind {
    pub fn of(err: &WatchError) -> FailureKind {
        match err {
            WatchError::MissingField(_) | WatchError::Config(_) => FailureKind::Config,
            WatchError::Auth(_) => FailureKind::Auth,
            WatchError::Access(_) => FailureKind::Access,
            WatchError::Http(_) | WatchError::Malformed(_) => FailureKind::Transient,
            WatchError::Io(_) | WatchError::Other(_) => FailureKind::Unknown,
        }
    }

    /// Fatal kinds end the session instead of scheduling a reconnect.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            FailureKind::Config | FailureKind::Auth | FailureKind::Access
        )
    }
}
