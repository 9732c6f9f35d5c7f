//! Relation lifecycle state machine.
//!
//! A relation is never partially visible: a load either publishes the whole
//! new relation or leaves whatever was there before.
//!
//! # State Machine
//!
//! ```text
//!     ┌──────────┐  load   ┌──────────┐  committed  ┌──────────┐
//!     │  Absent  │────────▶│ Loading  │────────────▶│  Loaded  │
//!     └──────────┘         └──────────┘             └──────────┘
//!           ▲                 │     ▲                     │
//!           │  failed (new)   │     │   forced reload     │
//!           └─────────────────┘     └─────────────────────┘
//! ```
//!
//! A failed forced reload goes `Loading → Loaded`, keeping the old relation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Load state of one relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationState {
    /// Not materialized in the store.
    Absent,
    /// A load is in flight.
    Loading,
    /// Materialized and queryable.
    Loaded,
}

impl RelationState {
    /// The lower-case name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
        }
    }
}

impl std::fmt::Display for RelationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates a state transition and returns the target state if valid.
///
/// # Errors
///
/// Returns `ServiceError::InvalidState` if the transition is not allowed.
pub fn validate_transition(
    table: &str,
    from: RelationState,
    to: RelationState,
) -> Result<RelationState> {
    if is_valid_transition(from, to) {
        Ok(to)
    } else {
        Err(ServiceError::InvalidState {
            table: table.to_string(),
            from,
            to,
        })
    }
}

/// Check if a state transition is valid according to the state machine.
#[must_use]
pub const fn is_valid_transition(from: RelationState, to: RelationState) -> bool {
    use RelationState::{Absent, Loaded, Loading};

    matches!(
        (from, to),
        (Absent | Loaded, Loading) | (Loading, Loaded | Absent)
    )
}

/// Returns true if queries against the relation can succeed.
#[must_use]
pub const fn is_queryable(state: RelationState) -> bool {
    matches!(state, RelationState::Loaded)
}
