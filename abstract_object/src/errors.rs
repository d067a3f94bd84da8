//! Error type for the abstract-object core.
//!
//! Every failure this crate can produce is a broken caller precondition —
//! there is nothing here that represents a recoverable or I/O condition.

use thiserror::Error;

/// Raised when a caller violates one of the documented invariants of
/// [`crate::object::AbstractObject`] (default-property shape, scope-chain
/// state machine, property-reference dispatch).
#[derive(Debug, Clone, Error)]
#[error("analysis invariant violated ({precondition}): {message}")]
pub struct AnalysisInvariantViolation {
    pub message: String,
    pub precondition: &'static str,
}

impl AnalysisInvariantViolation {
    pub fn new(precondition: &'static str, message: impl Into<String>) -> Self {
        AnalysisInvariantViolation {
            message: message.into(),
            precondition,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisInvariantViolation>;
