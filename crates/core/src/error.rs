//! Error types for s3c-core
//!
//! Every failure a shell command can produce maps onto one of these kinds.
//! The dispatcher prints them; one-shot mode also turns them into exit codes.

use thiserror::Error;

/// Result type alias for s3c-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for s3c-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Bucket or object does not exist
    #[error("{0}")]
    NotFound(String),

    /// A directory was required but the key names a file
    #[error("{0}")]
    NotADirectory(String),

    /// A file was required but the key names a directory
    #[error("{0}")]
    IsADirectory(String),

    /// Session or command state does not allow the operation
    #[error("{0}")]
    PreconditionFailed(String),

    /// Missing, excess or malformed command arguments
    #[error("{0}")]
    Argument(String),

    /// The user declined a confirmation or gave empty input
    #[error("{0}")]
    Aborted(String),

    /// The resource already exists
    #[error("{0}")]
    Conflict(String),

    /// The object store reported a failure
    #[error("{0}")]
    Store(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed connection name or record
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Wrap a store failure with the operation that caused it
    pub fn store(context: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Error::Store(format!("{context}: {err}"))
    }
}
