use std::io;
use thiserror::Error;

/// Custom error types for the score link
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Score read error: {0}")]
    ScoreRead(String),

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new malformed message error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedMessage(msg.into())
    }

    /// Creates a new score read error
    pub fn score_read(msg: impl Into<String>) -> Self {
        Error::ScoreRead(msg.into())
    }

    /// Creates a new socket error
    pub fn socket(msg: impl Into<String>) -> Self {
        Error::Socket(msg.into())
    }

    /// Creates a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether the owning endpoint must be torn down and rebuilt
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Socket(_) | Error::Io(_))
    }
}
