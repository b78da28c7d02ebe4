//! The tool seam.

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use foreman_core::ids::{RunId, TaskId};
use foreman_llm::client::ToolDescriptor;

use crate::errors::ToolError;

/// Per-invocation context handed to a tool.
///
/// Long-running tools should poll `cancellation` and bail out early;
/// the engine itself only checks it between invocations.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Run the invocation belongs to.
    pub run_id: RunId,
    /// Task on whose behalf the tool runs.
    pub task_id: TaskId,
    /// Run-wide cancellation token.
    pub cancellation: CancellationToken,
}

impl ToolContext {
    /// Context for `task_id` within `run_id`.
    pub fn new(run_id: RunId, task_id: TaskId, cancellation: CancellationToken) -> Self {
        Self {
            run_id,
            task_id,
            cancellation,
        }
    }
}

/// A capability endpoint: named, described, callable with JSON args.
///
/// Implementations must be stateless or internally synchronized —
/// a single registry is shared read-only across all concurrent
/// worker sessions of a run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Registered name.
    fn name(&self) -> &str;

    /// Description shown to the model.
    fn description(&self) -> &str;

    /// Execute with the given arguments, returning observation text.
    async fn execute(&self, arguments: Value, ctx: &ToolContext) -> Result<String, ToolError>;

    /// Descriptor advertised on `infer` calls.
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name(), self.description())
    }
}
