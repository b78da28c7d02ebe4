//! Name → tool lookup and metered invocation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde_json::Value;
use tracing::{debug, info, warn};

use foreman_llm::client::ToolDescriptor;

use crate::errors::ToolError;
use crate::traits::{Tool, ToolContext};

/// Registry of the tools available to worker sessions during a run.
///
/// Built once at wiring time, then shared read-only (`Arc`) across all
/// concurrent sessions. Registration replaces any tool already holding
/// the same name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_owned();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "tool re-registered, replacing previous");
        } else {
            debug!(tool = %name, "tool registered");
        }
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors for every registered tool, name-sorted for stable
    /// prompt context.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut out: Vec<ToolDescriptor> =
            self.tools.values().map(|t| t.descriptor()).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Invoke `name` with `arguments`.
    ///
    /// Unknown names and execution failures return a [`ToolError`] for
    /// the caller to fold into an observation turn. Cancellation is
    /// checked once before dispatch; a tool that is already running is
    /// never interrupted mid-invocation.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Value,
        ctx: &ToolContext,
    ) -> Result<String, ToolError> {
        let Some(tool) = self.get(name) else {
            warn!(tool = %name, "unknown tool requested");
            return Err(ToolError::NotFound {
                name: name.to_owned(),
            });
        };

        if ctx.cancellation.is_cancelled() {
            return Err(ToolError::Cancelled {
                name: name.to_owned(),
            });
        }

        let start = Instant::now();
        let result = tool.execute(arguments, ctx).await;

        counter!("tool_invocations_total", "tool" => name.to_owned()).increment(1);
        histogram!("tool_invocation_duration_seconds", "tool" => name.to_owned())
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => info!(tool = %name, elapsed_ms = start.elapsed().as_millis() as u64, "tool invoked"),
            Err(e) => warn!(tool = %name, error = %e, "tool invocation failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    use foreman_core::ids::{RunId, TaskId};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes the text argument back"
        }
        async fn execute(&self, arguments: Value, _ctx: &ToolContext) -> Result<String, ToolError> {
            arguments
                .get("text")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| ToolError::invalid_arguments("echo", "missing 'text'"))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "flaky"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        async fn execute(&self, _arguments: Value, _ctx: &ToolContext) -> Result<String, ToolError> {
            Err(ToolError::execution("flaky", "upstream 500"))
        }
    }

    fn make_ctx() -> ToolContext {
        ToolContext::new(
            RunId::from_raw("r1"),
            TaskId::from_raw("t1"),
            CancellationToken::new(),
        )
    }

    fn make_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(FailingTool));
        registry
    }

    #[tokio::test]
    async fn invoke_returns_observation_text() {
        let registry = make_registry();
        let text = registry
            .invoke("echo", json!({"text": "hello"}), &make_ctx())
            .await
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let registry = make_registry();
        let err = registry
            .invoke("nonexistent", json!({}), &make_ctx())
            .await
            .unwrap_err();
        assert_matches!(err, ToolError::NotFound { ref name } if name == "nonexistent");
    }

    #[tokio::test]
    async fn execution_failure_is_recoverable_error() {
        let registry = make_registry();
        let err = registry
            .invoke("flaky", json!({}), &make_ctx())
            .await
            .unwrap_err();
        assert_matches!(err, ToolError::Execution { .. });
    }

    #[tokio::test]
    async fn bad_arguments_reported() {
        let registry = make_registry();
        let err = registry
            .invoke("echo", json!({}), &make_ctx())
            .await
            .unwrap_err();
        assert_matches!(err, ToolError::InvalidArguments { .. });
    }

    #[tokio::test]
    async fn cancelled_context_skips_dispatch() {
        let registry = make_registry();
        let ctx = make_ctx();
        ctx.cancellation.cancel();
        let err = registry
            .invoke("echo", json!({"text": "x"}), &ctx)
            .await
            .unwrap_err();
        assert_matches!(err, ToolError::Cancelled { .. });
    }

    #[test]
    fn descriptors_are_sorted() {
        let registry = make_registry();
        let descriptors = registry.descriptors();
        let names: Vec<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["echo", "flaky"]);
    }

    #[test]
    fn re_registration_replaces() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(EchoTool));
        assert_eq!(registry.len(), 1);
    }
}
