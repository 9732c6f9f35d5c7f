//! Error types for the service layer.
//!
//! Absence of data is never an error here: lookups return `None`, list
//! operations return empty vectors, and load sweeps return reports. Only
//! caller contract violations and engine failures surface as `ServiceError`.

use publog_core::CodeError;
use publog_store::StoreError;
use thiserror::Error;

use crate::lifecycle::RelationState;

/// A result type using `ServiceError`.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur in service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The caller violated an argument precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The logical name is not in the catalog.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// A relation state change not allowed by the lifecycle.
    #[error("invalid state transition for {table}: cannot transition from {from:?} to {to:?}")]
    InvalidState {
        /// The relation being transitioned.
        table: String,
        /// The current state.
        from: RelationState,
        /// The requested target state.
        to: RelationState,
    },

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) | Self::Store(StoreError::InvalidIdentifier(_)) => 400,
            Self::UnknownTable(_) | Self::Store(StoreError::NotFound(_)) => 404,
            Self::InvalidState { .. } => 409,
            Self::Store(_) => 500,
        }
    }

    /// Returns true if this error might be resolved by retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Store(StoreError::Query(_) | StoreError::Io(_)))
    }
}

impl From<CodeError> for ServiceError {
    fn from(err: CodeError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
