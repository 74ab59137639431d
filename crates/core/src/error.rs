//! Allocation-domain error model.

use thiserror::Error;

use crate::id::InventoryItemId;

/// Result type used across the allocation engine.
pub type AllocationResult<T> = Result<T, AllocationError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business failures. `Overcommitted` is an
/// expected operational condition (a full item), not a bug, and carries enough
/// payload for consumers to surface it distinctly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// A value failed validation (e.g. non-positive line quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A status change with no edge in the transition table.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Committing the change would push reserved + sold past capacity.
    #[error("item {item_id} overcommitted: requested {requested}, available {available}")]
    Overcommitted {
        item_id: InventoryItemId,
        requested: i64,
        /// True headroom at check time; may be negative if the item was
        /// already overcommitted.
        available: i64,
    },

    /// The record moved between read and commit. Retry from fresh reads.
    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),

    /// A requested record was not found (domain-level).
    #[error("not found")]
    NotFound,
}

impl AllocationError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn concurrent(msg: impl Into<String>) -> Self {
        Self::ConcurrentModification(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
