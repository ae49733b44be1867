//! Domain validation errors.
//!
//! Returned when an input cannot be turned into a valid domain value, or
//! when an operation would make an illegal lifecycle transition.

use thiserror::Error;

use super::id::MarketId;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Winning options are 1 (YES) or 2 (NO).
    #[error("winning option must be 1 or 2, got {0}")]
    InvalidWinningOption(u64),

    /// A field literal needs at least one byte of input.
    #[error("cannot encode empty text as a field")]
    EmptyField,

    /// Stored status text is not a known lifecycle state.
    #[error("unknown market status: {0}")]
    UnknownStatus(String),

    /// Stored submission phase text is not a known phase.
    #[error("unknown submission phase: {0}")]
    UnknownPhase(String),

    /// Resolved markets are terminal and cannot be re-registered or resolved again.
    #[error("market {0} is already resolved")]
    AlreadyResolved(MarketId),

    /// Deadlines are unix seconds and cannot precede the epoch.
    #[error("deadline must be non-negative, got {0}")]
    NegativeDeadline(i64),

    /// Option labels are shown to stakers and cannot be blank.
    #[error("option label cannot be empty")]
    EmptyLabel,

    /// Thresholds must be finite numbers.
    #[error("threshold must be finite, got {0}")]
    NonFiniteThreshold(f64),
}
