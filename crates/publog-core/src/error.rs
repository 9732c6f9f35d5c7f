//! Common error types for the PubLog service.
//!
//! This module provides shared error types that are used across multiple crates.

use thiserror::Error;

use crate::catalog::Tier;

/// Errors raised while constructing a [`Catalog`](crate::Catalog).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two entries share the same logical name.
    #[error("duplicate logical table name: {0}")]
    DuplicateName(String),

    /// A tier lists a name that has no catalog entry.
    #[error("{tier} tier references unknown table: {name}")]
    UnknownTierMember {
        /// The tier holding the dangling reference.
        tier: Tier,
        /// The unknown logical name.
        name: String,
    },

    /// A name appears in more than one tier, or twice in the same tier.
    #[error("table {0} is assigned to more than one tier slot")]
    MultipleTiers(String),

    /// A logical name is not usable as a table identifier.
    #[error("invalid logical table name: {0:?}")]
    InvalidName(String),
}
