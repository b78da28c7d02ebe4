//! The reasoning client seam.
//!
//! Concrete backends (hosted model APIs) live outside this workspace;
//! the engine only ever sees this trait. Implementations must be
//! stateless per call — one client instance is shared read-only across
//! every concurrent worker session of a run.

use async_trait::async_trait;
use serde_json::Value;

use foreman_core::transcript::Transcript;

use crate::decision::Decision;
use crate::errors::InferenceError;

/// A tool made visible to the model on an `infer` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    /// Registered tool name.
    pub name: String,
    /// Human/model-readable description.
    pub description: String,
}

impl ToolDescriptor {
    /// Build a descriptor.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Abstraction of one model call: (context, tools) → decision.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Produce the next [`Decision`] for the given transcript.
    ///
    /// `response_schema` optionally constrains the output shape (used by
    /// supervisors that expect a structured directive). Implementations
    /// map provider failures onto [`InferenceError`]; they never panic.
    async fn infer(
        &self,
        transcript: &Transcript,
        tools: &[ToolDescriptor],
        response_schema: Option<&Value>,
    ) -> Result<Decision, InferenceError>;
}
