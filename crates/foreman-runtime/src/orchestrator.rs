//! Public entry point for an orchestration run.
//!
//! Wires the supervisor, worker pool, registry, and emitter together,
//! enforces the overall wall-clock timeout, and always hands back an
//! [`OrchestrationResult`] once work has started — timeout and
//! cancellation degrade the result instead of raising.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use foreman_core::ids::RunId;
use foreman_llm::client::ReasoningClient;
use foreman_tools::registry::ToolRegistry;

use crate::aggregator::Aggregator;
use crate::config::OrchestrationConfig;
use crate::emitter::EventEmitter;
use crate::errors::RuntimeError;
use crate::pool::WorkerPool;
use crate::supervisor::Supervisor;
use crate::types::{OrchestrationResult, SupervisorState};

/// How long a cancelled supervisor gets to reach its next checkpoint
/// before the run task is aborted outright.
const CANCEL_GRACE: Duration = Duration::from_secs(5);

/// Orchestration engine: one instance can serve many runs.
pub struct Orchestrator {
    client: Arc<dyn ReasoningClient>,
    registry: Arc<ToolRegistry>,
    emitter: Arc<EventEmitter>,
    config: OrchestrationConfig,
}

impl Orchestrator {
    /// Engine over a reasoning client and a tool registry.
    pub fn new(
        client: Arc<dyn ReasoningClient>,
        registry: Arc<ToolRegistry>,
        config: OrchestrationConfig,
    ) -> Self {
        Self {
            client,
            registry,
            emitter: Arc::new(EventEmitter::new()),
            config,
        }
    }

    /// The run's event stream.
    pub fn emitter(&self) -> &Arc<EventEmitter> {
        &self.emitter
    }

    /// Orchestrate `request` to completion under the configured limits.
    pub async fn run(&self, request: impl Into<String>) -> Result<OrchestrationResult, RuntimeError> {
        self.run_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run), with a caller-held cancellation token.
    /// Cancelling it ends the run at the next checkpoint with whatever
    /// results exist so far.
    #[instrument(skip_all)]
    pub async fn run_with_cancellation(
        &self,
        request: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<OrchestrationResult, RuntimeError> {
        self.config.validate()?;
        let request = request.into();
        let run_id = RunId::new();
        let started = Instant::now();
        info!(run_id = %run_id, "run starting");
        let events = self.emitter.for_run(run_id.clone());
        events.run_started(&request);

        let state = Arc::new(Mutex::new(SupervisorState::new(request)));
        let pool = WorkerPool::new(
            Arc::clone(&self.client),
            Arc::clone(&self.registry),
            events.clone(),
            self.config.clone(),
        );
        let supervisor = Supervisor::new(
            Arc::clone(&self.client),
            pool,
            events.clone(),
            self.config.clone(),
            Arc::clone(&state),
            cancel.clone(),
        );

        let mut handle = tokio::spawn(async move { supervisor.run().await });
        // A panicked coordination loop must still surface as a degraded
        // result, never as a clean one.
        let mut supervisor_crashed = false;
        let timed_out = match tokio::time::timeout(self.config.overall_timeout, &mut handle).await {
            Ok(join) => {
                if let Err(err) = join {
                    warn!(run_id = %run_id, error = %err, "coordination task failed");
                    supervisor_crashed = true;
                }
                false
            }
            Err(_) => {
                warn!(run_id = %run_id, "overall timeout reached, cancelling run");
                cancel.cancel();
                // Let in-flight work reach a checkpoint, then give up.
                match tokio::time::timeout(CANCEL_GRACE, &mut handle).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        warn!(run_id = %run_id, error = %err, "coordination task failed");
                        supervisor_crashed = true;
                    }
                    Err(_) => {
                        warn!(run_id = %run_id, "grace period expired, aborting run task");
                        handle.abort();
                    }
                }
                true
            }
        };

        let snapshot = state.lock().clone();
        let final_report = Aggregator::synthesize(&snapshot.brief, &snapshot.notes);
        let degraded =
            snapshot.degraded || supervisor_crashed || snapshot.notes.iter().any(|n| n.degraded);

        events.run_finished(snapshot.iteration_count, timed_out);
        let outcome = if timed_out { "timed_out" } else { "completed" };
        counter!("runs_total", "outcome" => outcome).increment(1);
        histogram!("run_duration_seconds").record(started.elapsed().as_secs_f64());
        info!(
            run_id = %run_id,
            iterations = snapshot.iteration_count,
            workers = snapshot.worker_count,
            timed_out,
            degraded,
            "run finished"
        );

        Ok(OrchestrationResult {
            final_report,
            notes: snapshot.notes,
            iterations_used: snapshot.iteration_count,
            worker_count: snapshot.worker_count,
            timed_out,
            degraded,
        })
    }
}
