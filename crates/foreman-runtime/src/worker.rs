//! Worker session — one bounded reason-act-observe loop.
//!
//! START → THINK → {TOOL_CALL → OBSERVE → THINK}* → COMPRESS → DONE,
//! or → FAILED. The loop suspends on `infer` and on tool invocation;
//! cancellation is honored only at the checkpoints between those
//! suspension points, never mid-invocation. Whatever happens inside the
//! session is contained: the caller always gets a [`WorkerResult`]
//! back, never an error.

use std::sync::Arc;

use metrics::counter;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use foreman_core::retry::RetryConfig;
use foreman_core::task::{Task, TaskStatus};
use foreman_core::text::clamp_utf8;
use foreman_core::transcript::{Transcript, Turn};
use foreman_llm::client::ReasoningClient;
use foreman_llm::decision::Decision;
use foreman_llm::infer_with_retry;
use foreman_tools::registry::ToolRegistry;
use foreman_tools::traits::ToolContext;
use foreman_tools::ToolError;

use crate::emitter::RunEmitter;
use crate::types::WorkerResult;

/// A single worker session bound to one delegated task.
pub struct WorkerSession {
    client: Arc<dyn ReasoningClient>,
    registry: Arc<ToolRegistry>,
    events: RunEmitter,
    tool_call_cap: u32,
    compression_budget: usize,
    retry: RetryConfig,
    cancel: CancellationToken,
}

impl WorkerSession {
    /// Build a session. `cancel` is the run-wide token shared by every
    /// session of the batch.
    pub fn new(
        client: Arc<dyn ReasoningClient>,
        registry: Arc<ToolRegistry>,
        events: RunEmitter,
        tool_call_cap: u32,
        compression_budget: usize,
        retry: RetryConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            registry,
            events,
            tool_call_cap,
            compression_budget,
            retry,
            cancel,
        }
    }

    /// Run the loop to a terminal [`WorkerResult`].
    #[instrument(skip_all, fields(task_id = %task.id))]
    pub async fn run(&self, mut task: Task) -> WorkerResult {
        if let Err(err) = task.advance(TaskStatus::Running) {
            return self.finish(WorkerResult::failed(task.id.clone(), err.to_string()));
        }
        self.events.worker_started(&task.id);

        let tools = self.registry.descriptors();
        let mut transcript = Transcript::from_instructions(task.instructions.clone());
        let mut tool_call_count: u32 = 0;
        // Guards against a model that never acts and never finishes;
        // reflections and unusable directives burn this budget instead
        // of the tool-call one.
        let mut idle_count: u32 = 0;
        let mut degraded = false;

        loop {
            // Checkpoint: before THINK.
            if self.cancel.is_cancelled() {
                return self.finish(WorkerResult::cancelled(task.id.clone(), transcript.render()));
            }

            let decision =
                match infer_with_retry(&*self.client, &transcript, &tools, None, &self.retry).await
                {
                    Ok(d) => d,
                    Err(err) => {
                        warn!(error = %err, "worker inference failed");
                        return self.finish(WorkerResult::failed(task.id.clone(), err.to_string()));
                    }
                };

            match decision {
                Decision::ToolCall(request) => {
                    transcript.push(Turn::assistant_tool_call(
                        request.name.clone(),
                        request.arguments.clone(),
                    ));
                    let ctx = ToolContext::new(
                        self.events.run_id().clone(),
                        task.id.clone(),
                        self.cancel.clone(),
                    );
                    let observation = self
                        .registry
                        .invoke(&request.name, request.arguments, &ctx)
                        .await;

                    self.events
                        .tool_invoked(&task.id, &request.name, observation.is_err());

                    match observation {
                        Ok(text) => transcript.push(Turn::observation(text)),
                        Err(ToolError::Cancelled { .. }) => {
                            return self
                                .finish(WorkerResult::cancelled(task.id.clone(), transcript.render()));
                        }
                        // Recoverable: the model sees the failure and
                        // decides whether to retry or abandon the path.
                        Err(err) => transcript.push(Turn::observation(format!("tool error: {err}"))),
                    }

                    tool_call_count += 1;
                    if tool_call_count >= self.tool_call_cap {
                        debug!(tool_call_count, "tool-call cap reached, forcing compression");
                        degraded = true;
                        break;
                    }

                    // Checkpoint: immediately after a tool call returns.
                    if self.cancel.is_cancelled() {
                        return self
                            .finish(WorkerResult::cancelled(task.id.clone(), transcript.render()));
                    }
                }
                Decision::TextAnswer { text } => {
                    transcript.push(Turn::assistant(text));
                    break;
                }
                Decision::Complete => break,
                Decision::Reflect { note } => {
                    transcript.push(Turn::assistant(note));
                    idle_count += 1;
                    if idle_count >= self.tool_call_cap {
                        degraded = true;
                        break;
                    }
                }
                Decision::Delegate { topics } => {
                    // Workers sit at the bottom of the 2-level hierarchy.
                    transcript.push(Turn::observation(format!(
                        "delegation is not available at the worker level (requested {} topics)",
                        topics.len()
                    )));
                    idle_count += 1;
                    if idle_count >= self.tool_call_cap {
                        degraded = true;
                        break;
                    }
                }
                Decision::Unrecognized { raw } => {
                    transcript.push(Turn::observation(format!("unrecognized directive: {raw}")));
                    idle_count += 1;
                    if idle_count >= self.tool_call_cap {
                        degraded = true;
                        break;
                    }
                }
            }
        }

        // COMPRESS — must never fail the task.
        let raw_notes = transcript.render();
        let (compressed_summary, compression_degraded) = self.compress(&raw_notes).await;

        if let Err(err) = task.advance(TaskStatus::Completed) {
            return self.finish(WorkerResult::failed(task.id.clone(), err.to_string()));
        }
        self.finish(WorkerResult {
            task_id: task.id,
            compressed_summary,
            raw_notes,
            status: TaskStatus::Completed,
            degraded: degraded || compression_degraded,
            error: None,
        })
    }

    /// Summarize the rendered transcript, falling back to deterministic
    /// truncation when the summarization call itself fails.
    async fn compress(&self, raw_notes: &str) -> (String, bool) {
        let mut prompt = Transcript::new();
        prompt.push(Turn::user(format!(
            "Summarize the following working transcript into a concise note \
             capturing findings, sources, and unresolved gaps:\n\n{raw_notes}"
        )));

        match infer_with_retry(&*self.client, &prompt, &[], None, &self.retry).await {
            Ok(Decision::TextAnswer { text }) if !text.is_empty() => (text, false),
            Ok(other) => {
                debug!(?other, "summarization returned a non-text directive, truncating");
                (clamp_utf8(raw_notes, self.compression_budget), true)
            }
            Err(err) => {
                warn!(error = %err, "summarization failed, truncating");
                (clamp_utf8(raw_notes, self.compression_budget), true)
            }
        }
    }

    /// Emit the terminal event and record metrics.
    fn finish(&self, result: WorkerResult) -> WorkerResult {
        let status_label = match result.status {
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
            _ => "unknown",
        };
        counter!("worker_runs_total", "status" => status_label).increment(1);
        info!(task_id = %result.task_id, status = status_label, degraded = result.degraded, "worker finished");
        self.events
            .worker_finished(&result.task_id, result.status, result.degraded);
        result
    }
}
