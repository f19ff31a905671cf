//! Error types for lmsbot-core

use thiserror::Error;

/// Result type alias using lmsbot-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lmsbot-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The LMS API answered with an error
    #[error("LMS API error: {0}")]
    Lms(String),

    /// The notifier rejected a message
    #[error("Notifier error: {0}")]
    Notify(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
