//! Error types for the storage layer.

use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested relation (or column) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The engine rejected or failed a statement.
    #[error("query error: {0}")]
    Query(String),

    /// An identifier is not a plain `[A-Za-z0-9_]` name.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// The source file could not be parsed as CSV.
    #[error("csv error: {0}")]
    Csv(String),

    /// Reading the source file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns true if this error means the target relation is missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Query(err.to_string())
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => Self::Io(io),
                other => Self::Csv(format!("{other:?}")),
            }
        } else {
            Self::Csv(err.to_string())
        }
    }
}
