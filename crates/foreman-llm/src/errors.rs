//! Inference error taxonomy.

use thiserror::Error;

/// Failure of a single `infer` call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferenceError {
    /// Temporary failure (rate limit, connection reset). Retried at the
    /// point of use with bounded backoff.
    #[error("transient inference failure: {message}")]
    Transient {
        /// Provider-reported reason.
        message: String,
    },

    /// Non-retryable failure (invalid credentials, context overflow,
    /// content policy). The owning task is marked failed.
    #[error("fatal inference failure: {message}")]
    Fatal {
        /// Provider-reported reason.
        message: String,
    },
}

impl InferenceError {
    /// Transient failure with the given reason.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Fatal failure with the given reason.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    /// Whether callers should retry this failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_is_retryable() {
        assert!(InferenceError::transient("429").is_transient());
        assert!(!InferenceError::fatal("401").is_transient());
    }

    #[test]
    fn display_includes_reason() {
        let err = InferenceError::fatal("context overflow");
        assert!(err.to_string().contains("context overflow"));
        assert!(err.to_string().contains("fatal"));
    }
}
