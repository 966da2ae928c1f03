//! Error types for bookdb

use thiserror::Error;

/// Result type alias for bookdb operations
pub type Result<T> = std::result::Result<T, BookdbError>;

/// Main error type for bookdb
#[derive(Error, Debug)]
pub enum BookdbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
