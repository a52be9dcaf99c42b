//! Errors raised while validating a layout request.
//!
//! Only malformed input fails a solve. Anything discovered after validation
//! (unknown ids, infeasible bounds, non-finite losses) degrades in place and
//! is reported through the transcript and the logs instead.

use thiserror::Error;

/// Errors that can occur before the solver starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Invalid room boundary: {0}")]
    InvalidBoundary(String),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Invalid entity '{id}': {reason}")]
    InvalidEntity { id: String, reason: String },
}

/// Result type for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;
