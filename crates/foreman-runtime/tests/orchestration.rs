//! End-to-end orchestration runs against a scripted reasoning client.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use foreman_core::retry::RetryConfig;
use foreman_llm::{Decision, InferenceError, ReasoningClient, ScriptedClient, ToolRequest};
use foreman_runtime::{NoteKind, OrchestrationConfig, Orchestrator};
use foreman_tools::registry::ToolRegistry;
use foreman_tools::traits::{Tool, ToolContext};
use foreman_tools::ToolError;

fn fast_config() -> OrchestrationConfig {
    OrchestrationConfig {
        concurrency_limit: 2,
        retry: RetryConfig {
            max_retries: 0,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        },
        ..OrchestrationConfig::default()
    }
}

fn orchestrator_with(
    client: ScriptedClient,
    registry: ToolRegistry,
    config: OrchestrationConfig,
) -> (Orchestrator, Arc<ScriptedClient>) {
    let client = Arc::new(client);
    let orchestrator = Orchestrator::new(
        Arc::clone(&client) as Arc<dyn ReasoningClient>,
        Arc::new(registry),
        config,
    );
    (orchestrator, client)
}

/// Tool that counts its invocations.
struct ProbeTool {
    calls: AtomicUsize,
}

impl ProbeTool {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Tool for ProbeTool {
    fn name(&self) -> &str {
        "probe"
    }
    fn description(&self) -> &str {
        "Probes the target and reports"
    }
    async fn execute(&self, _arguments: Value, _ctx: &ToolContext) -> Result<String, ToolError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("probe result {n}"))
    }
}

/// Tool that cancels the run it is part of.
struct HaltTool;

#[async_trait]
impl Tool for HaltTool {
    fn name(&self) -> &str {
        "halt"
    }
    fn description(&self) -> &str {
        "Stops the run"
    }
    async fn execute(&self, _arguments: Value, ctx: &ToolContext) -> Result<String, ToolError> {
        ctx.cancellation.cancel();
        Ok("halting".into())
    }
}

#[tokio::test]
async fn comparison_request_fans_out_and_joins() {
    // Both workers and both of their summarization calls draw the same
    // scripted text, so the pool's interleaving cannot change the
    // outcome.
    let client = ScriptedClient::new(vec![
        Ok(Decision::delegate(["measure X", "measure Y"])),
        Ok(Decision::text("measured 3kg")),
        Ok(Decision::text("measured 3kg")),
        Ok(Decision::text("measured 3kg")),
        Ok(Decision::text("measured 3kg")),
        Ok(Decision::Complete),
    ]);
    let (orchestrator, client) = orchestrator_with(client, ToolRegistry::new(), fast_config());

    let result = orchestrator.run("compare X and Y").await.unwrap();

    assert_eq!(result.worker_count, 2);
    assert_eq!(result.iterations_used, 2);
    assert!(!result.timed_out);
    assert!(!result.degraded);
    assert_eq!(
        result
            .notes
            .iter()
            .filter(|n| n.kind == NoteKind::Finding)
            .count(),
        2
    );
    assert!(result.final_report.contains("measured 3kg"));
    assert!(client.peak_concurrency() <= 2);
}

#[tokio::test]
async fn concurrency_limit_holds_across_a_wide_delegation() {
    let topics: Vec<String> = (0..6).map(|i| format!("topic {i}")).collect();
    let client = ScriptedClient::new(vec![Ok(Decision::delegate(topics))])
        .with_repeat(Ok(Decision::text("done")))
        .with_delay(Duration::from_millis(15));
    let config = OrchestrationConfig {
        max_units_per_batch: 6,
        max_supervisor_iterations: 1,
        ..fast_config()
    };
    let (orchestrator, client) = orchestrator_with(client, ToolRegistry::new(), config);

    let result = orchestrator.run("survey the topics").await.unwrap();

    assert_eq!(result.worker_count, 6);
    assert!(client.peak_concurrency() <= 2);
}

#[tokio::test]
async fn limit_of_one_serializes_workers() {
    let client = ScriptedClient::new(vec![Ok(Decision::delegate(["a", "b", "c"]))])
        .with_repeat(Ok(Decision::text("done")))
        .with_delay(Duration::from_millis(10));
    let config = OrchestrationConfig {
        concurrency_limit: 1,
        max_supervisor_iterations: 1,
        ..fast_config()
    };
    let (orchestrator, client) = orchestrator_with(client, ToolRegistry::new(), config);

    let result = orchestrator.run("survey").await.unwrap();

    assert_eq!(result.worker_count, 3);
    assert_eq!(client.peak_concurrency(), 1);
}

#[tokio::test]
async fn one_failed_worker_still_yields_a_report() {
    let client = ScriptedClient::new(vec![
        Ok(Decision::delegate(["measure X", "measure Y"])),
        Err(InferenceError::fatal("provider refused")),
        Ok(Decision::text("Y weighs 5kg")),
        Ok(Decision::text("Y weighs 5kg")),
        Ok(Decision::Complete),
    ]);
    let config = OrchestrationConfig {
        concurrency_limit: 1,
        ..fast_config()
    };
    let (orchestrator, _) = orchestrator_with(client, ToolRegistry::new(), config);

    let result = orchestrator.run("compare X and Y").await.unwrap();

    let failures = result
        .notes
        .iter()
        .filter(|n| n.kind == NoteKind::Failure)
        .count();
    assert_eq!(failures, 1);
    assert!(result.final_report.contains("Y weighs 5kg"));
    assert!(result.final_report.contains("failed"));
    assert!(!result.timed_out);
}

#[tokio::test]
async fn all_workers_failing_produces_fallback_report() {
    let client = ScriptedClient::new(vec![
        Ok(Decision::delegate(["measure X", "measure Y"])),
        Err(InferenceError::fatal("refused A")),
        Err(InferenceError::fatal("refused B")),
        Ok(Decision::Complete),
    ]);
    let config = OrchestrationConfig {
        concurrency_limit: 1,
        ..fast_config()
    };
    let (orchestrator, _) = orchestrator_with(client, ToolRegistry::new(), config);

    let result = orchestrator.run("compare X and Y").await.unwrap();

    assert!(result.final_report.contains("Insufficient information"));
    assert!(result.final_report.contains("refused A"));
    assert!(result.final_report.contains("refused B"));
}

#[tokio::test]
async fn tool_call_cap_degrades_instead_of_spinning() {
    let probe = ProbeTool::new();
    let mut registry = ToolRegistry::new();
    registry.register(probe.clone());

    // The model never stops asking for the probe; both the worker's
    // tool budget and the supervisor's iteration cap have to step in.
    let client = ScriptedClient::new(vec![Ok(Decision::delegate(["probe the target"]))])
        .with_repeat(Ok(Decision::ToolCall(ToolRequest::new("probe", json!({})))));
    let config = OrchestrationConfig {
        per_worker_tool_call_cap: 3,
        max_supervisor_iterations: 2,
        ..fast_config()
    };
    let (orchestrator, _) = orchestrator_with(client, registry, config);

    let result = orchestrator.run("probe it").await.unwrap();

    assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
    assert!(result.degraded);
    let finding = result
        .notes
        .iter()
        .find(|n| n.kind == NoteKind::Finding)
        .expect("worker still produced a note");
    assert!(finding.degraded);
    assert!(finding.text.contains("probe result"));
}

#[tokio::test]
async fn iteration_cap_bounds_an_endless_planner() {
    let client = ScriptedClient::new(vec![
        Ok(Decision::delegate(["look into it"])),
        Ok(Decision::text("looked into it")),
        Ok(Decision::text("looked into it")),
    ])
    .with_repeat(Ok(Decision::reflect("still planning")));
    let config = OrchestrationConfig {
        concurrency_limit: 1,
        max_supervisor_iterations: 3,
        ..fast_config()
    };
    let (orchestrator, _) = orchestrator_with(client, ToolRegistry::new(), config);

    let result = orchestrator.run("open-ended request").await.unwrap();

    assert_eq!(result.iterations_used, 3);
    assert!(result.degraded);
    assert_eq!(result.worker_count, 1);
    // The finding gathered before the cap still reaches the report.
    assert!(result.final_report.contains("looked into it"));
}

#[tokio::test]
async fn mid_batch_cancellation_returns_partial_state() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(HaltTool));

    let client = ScriptedClient::new(vec![
        Ok(Decision::delegate(["first topic", "second topic"])),
        Ok(Decision::ToolCall(ToolRequest::new("halt", json!({})))),
    ]);
    let config = OrchestrationConfig {
        concurrency_limit: 1,
        ..fast_config()
    };
    let (orchestrator, client) = orchestrator_with(client, registry, config);

    let result = orchestrator.run("two-part request").await.unwrap();

    // Worker one hit the checkpoint after its tool returned; worker two
    // never started.
    let cancelled = result
        .notes
        .iter()
        .filter(|n| n.kind == NoteKind::Cancellation)
        .count();
    assert_eq!(cancelled, 2);
    assert!(!result.timed_out);
    assert_eq!(client.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn external_cancellation_ends_the_run_at_a_checkpoint() {
    let client = ScriptedClient::always(Ok(Decision::reflect("thinking")))
        .with_delay(Duration::from_secs(1));
    let (orchestrator, _) = orchestrator_with(client, ToolRegistry::new(), fast_config());
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            cancel.cancel();
        }
    };
    let (result, ()) = tokio::join!(
        orchestrator.run_with_cancellation("slow request", cancel.clone()),
        canceller
    );
    let result = result.unwrap();

    assert!(!result.timed_out);
    assert_eq!(result.iterations_used, 2);
}

#[tokio::test(start_paused = true)]
async fn overall_timeout_yields_best_effort_result() {
    let client = ScriptedClient::new(vec![
        Ok(Decision::delegate(["quick topic"])),
        Ok(Decision::text("got it")),
        Ok(Decision::text("got it")),
    ])
    .with_repeat(Ok(Decision::reflect("mulling")))
    .with_delay(Duration::from_secs(30));
    let config = OrchestrationConfig {
        concurrency_limit: 1,
        overall_timeout: Duration::from_secs(100),
        ..fast_config()
    };
    let (orchestrator, _) = orchestrator_with(client, ToolRegistry::new(), config);

    let result = orchestrator.run("compare X and Y").await.unwrap();

    // The delegation finished before the deadline; the endless mulling
    // afterwards is what the timeout cut short.
    assert!(result.timed_out);
    assert_eq!(result.worker_count, 1);
    assert!(result.final_report.contains("got it"));
}

#[tokio::test]
async fn events_tell_the_whole_story() {
    let client = ScriptedClient::new(vec![
        Ok(Decision::delegate(["measure X"])),
        Ok(Decision::text("3kg")),
        Ok(Decision::text("3kg")),
        Ok(Decision::Complete),
    ]);
    let config = OrchestrationConfig {
        concurrency_limit: 1,
        ..fast_config()
    };
    let (orchestrator, _) = orchestrator_with(client, ToolRegistry::new(), config);
    let mut events = orchestrator.emitter().subscribe();

    orchestrator.run("compare").await.unwrap();

    let mut types = Vec::new();
    while let Ok(event) = events.try_recv() {
        types.push(event.event_type());
    }
    assert_eq!(types.first(), Some(&"run_started"));
    assert!(types.contains(&"batch_delegated"));
    assert!(types.contains(&"worker_started"));
    assert!(types.contains(&"worker_finished"));
    assert_eq!(types.last(), Some(&"run_finished"));
}
