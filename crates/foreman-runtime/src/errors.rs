//! Runtime error types.
//!
//! Only precondition failures surface as errors: once work begins, the
//! engine degrades results instead of raising. Everything else in the
//! taxonomy (fatal inference, tool failures, cancellation, timeout) is
//! folded into statuses and flags on the results themselves.

use thiserror::Error;

/// Errors raised to the caller before any work starts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuntimeError {
    /// The supplied configuration cannot run.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was rejected.
        reason: String,
    },
}

impl RuntimeError {
    /// Configuration rejection with the given reason.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
