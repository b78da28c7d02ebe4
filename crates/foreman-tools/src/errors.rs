//! Tool error taxonomy.
//!
//! Every variant here is recoverable: the worker loop turns it into an
//! observation and lets the model retry or abandon that path itself.

use thiserror::Error;

/// Failure of a single tool invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    /// No tool registered under the requested name.
    #[error("tool not found: {name}")]
    NotFound {
        /// The unknown name.
        name: String,
    },

    /// Arguments did not match what the tool expects.
    #[error("invalid arguments for {name}: {reason}")]
    InvalidArguments {
        /// Tool name.
        name: String,
        /// What was wrong.
        reason: String,
    },

    /// The tool ran and failed.
    #[error("tool {name} failed: {reason}")]
    Execution {
        /// Tool name.
        name: String,
        /// Failure reason.
        reason: String,
    },

    /// The run was cancelled before the tool started.
    #[error("tool {name} skipped: run cancelled")]
    Cancelled {
        /// Tool name.
        name: String,
    },
}

impl ToolError {
    /// Execution failure for `name`.
    pub fn execution(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Execution {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Invalid-argument failure for `name`.
    pub fn invalid_arguments(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_tool() {
        let err = ToolError::NotFound {
            name: "webz".into(),
        };
        assert!(err.to_string().contains("webz"));

        let err = ToolError::execution("search", "upstream 500");
        assert!(err.to_string().contains("search"));
        assert!(err.to_string().contains("upstream 500"));
    }
}
