//! Error kind taxonomy
//!
//! Every component keeps its own detailed error enum. Each of those maps onto
//! exactly one of these kinds, which is what callers branch on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a rejected operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Referenced vault, pool, order or swap does not exist
    NotFound,
    /// Caller-supplied value outside its allowed range
    InvalidParameter,
    /// Proof failed verification
    InvalidProof,
    /// Entity is in a state that forbids the operation
    InvalidState,
    /// Caller lacks the required relationship to the entity
    Unauthorized,
    /// A mutating operation was re-entered before it committed
    ReentrancyDetected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::InvalidParameter => "invalid parameter",
            ErrorKind::InvalidProof => "invalid proof",
            ErrorKind::InvalidState => "invalid state",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::ReentrancyDetected => "reentrancy detected",
        };
        f.write_str(label)
    }
}
