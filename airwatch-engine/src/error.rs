//! Common error types for Airwatch

use thiserror::Error;

/// Common result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the advisory engine and its collaborators
///
/// The first three variants are the domain taxonomy callers translate into
/// user-facing messages. The rest come from the ambient stack (storage,
/// configuration files).
#[derive(Error, Debug)]
pub enum Error {
    /// AQI input was negative, non-numeric or non-finite
    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    /// Subscription field out of range or empty
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown subscription id (or other missing resource)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidReading(_) => "INVALID_READING",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            #[cfg(feature = "sqlx")]
            Error::Database(_) => "DATABASE_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
        }
    }
}
