//! The coordination loop.
//!
//! One supervisor per run. Each iteration rebuilds the coordination
//! transcript from the brief plus every accumulated note, asks the
//! model for the next move, and acts on it: delegate a batch, record a
//! reflection, or complete. The iteration cap is the loop's only
//! termination guarantee — a model that never signals completion still
//! ends the run, with the result marked degraded.
//!
//! State lives behind a shared mutex so the orchestrator can read a
//! best-effort snapshot even when the timeout aborts the loop mid-way.

use std::sync::Arc;

use metrics::counter;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use foreman_core::task::Task;
use foreman_core::transcript::{Transcript, Turn};
use foreman_llm::client::ReasoningClient;
use foreman_llm::decision::Decision;
use foreman_llm::infer_with_retry;

use crate::config::OrchestrationConfig;
use crate::emitter::RunEmitter;
use crate::pool::WorkerPool;
use crate::types::{Note, SupervisorState, SupervisorStatus};

/// Single-threaded coordinator driving one run.
pub struct Supervisor {
    client: Arc<dyn ReasoningClient>,
    pool: WorkerPool,
    events: RunEmitter,
    config: OrchestrationConfig,
    state: Arc<Mutex<SupervisorState>>,
    cancel: CancellationToken,
}

impl Supervisor {
    /// Supervisor for one run. `state` is shared with the orchestrator
    /// so partial progress stays readable after an abort.
    pub fn new(
        client: Arc<dyn ReasoningClient>,
        pool: WorkerPool,
        events: RunEmitter,
        config: OrchestrationConfig,
        state: Arc<Mutex<SupervisorState>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            pool,
            events,
            config,
            state,
            cancel,
        }
    }

    /// Drive the loop until completion, a forced cap, or cancellation.
    #[instrument(skip_all, fields(run_id = %self.events.run_id()))]
    pub async fn run(&self) {
        loop {
            if self.cancel.is_cancelled() {
                debug!("coordination cancelled");
                break;
            }

            let Some(iteration) = self.begin_iteration() else {
                // Cap reached with no completion signal.
                warn!(
                    cap = self.config.max_supervisor_iterations,
                    "iteration cap reached, forcing completion"
                );
                counter!("supervisor_forced_completions_total").increment(1);
                self.state.lock().degraded = true;
                break;
            };
            self.events.iteration_started(iteration);

            let transcript = self.build_transcript();
            let decision = infer_with_retry(
                &*self.client,
                &transcript,
                &[],
                None,
                &self.config.retry,
            )
            .await;

            let decision = match decision {
                Ok(d) => d,
                Err(err) => {
                    warn!(error = %err, "coordination inference failed, ending run");
                    let mut state = self.state.lock();
                    state
                        .notes
                        .push(Note::reflection(format!("coordination halted: {err}")));
                    state.degraded = true;
                    break;
                }
            };

            match decision {
                Decision::Delegate { topics } if !topics.is_empty() => {
                    self.delegate(iteration, topics).await;
                    if self.cancel.is_cancelled() {
                        break;
                    }
                }
                Decision::Delegate { .. } => {
                    self.state
                        .lock()
                        .notes
                        .push(Note::reflection("delegation requested with no topics"));
                }
                Decision::Reflect { note } => {
                    debug!(iteration, "supervisor reflecting");
                    self.set_status(SupervisorStatus::Reflecting);
                    self.state.lock().notes.push(Note::reflection(note));
                }
                Decision::Complete => {
                    info!(iteration, "supervisor signalled completion");
                    self.set_status(SupervisorStatus::Completing);
                    break;
                }
                Decision::TextAnswer { text } => {
                    // Direct-answer path: the brief needed no delegation.
                    info!(iteration, "supervisor answered directly");
                    self.set_status(SupervisorStatus::Completing);
                    self.state.lock().notes.push(Note::finding(text));
                    break;
                }
                Decision::ToolCall(request) => {
                    // Tools belong to workers; fold the attempt back as
                    // context instead of failing the run.
                    self.state.lock().notes.push(Note::reflection(format!(
                        "tool '{}' is not available at the coordination level",
                        request.name
                    )));
                }
                Decision::Unrecognized { raw } => {
                    self.state
                        .lock()
                        .notes
                        .push(Note::reflection(format!("unrecognized directive: {raw}")));
                }
            }
        }

        self.set_status(SupervisorStatus::Done);
    }

    /// Claim the next iteration slot, or `None` when the cap is spent.
    fn begin_iteration(&self) -> Option<u32> {
        let mut state = self.state.lock();
        if state.iteration_count >= self.config.max_supervisor_iterations {
            return None;
        }
        state.iteration_count += 1;
        state.status = SupervisorStatus::Planning;
        Some(state.iteration_count)
    }

    fn set_status(&self, status: SupervisorStatus) {
        self.state.lock().status = status;
    }

    /// Rebuild the coordination transcript: brief first, then every
    /// accumulated note in order. Stateless between iterations.
    fn build_transcript(&self) -> Transcript {
        let state = self.state.lock();
        let mut transcript = Transcript::from_instructions(format!(
            "You are coordinating a multi-step request. Delegate sub-topics to \
             workers, reflect on their findings, and signal completion once the \
             request is satisfied.\n\nRequest: {}",
            state.brief
        ));
        for note in &state.notes {
            transcript.push(Turn::observation(format!(
                "[{}] {}",
                note.kind.as_str(),
                note.text
            )));
        }
        transcript
    }

    /// Fan the topics out in batches and fold the results into notes.
    async fn delegate(&self, iteration: u32, topics: Vec<String>) {
        info!(iteration, topics = topics.len(), "delegating");
        self.set_status(SupervisorStatus::Delegating);

        for chunk in topics.chunks(self.config.max_units_per_batch) {
            if self.cancel.is_cancelled() {
                break;
            }

            let tasks: Vec<Task> = chunk.iter().map(Task::new).collect();
            self.events
                .batch_delegated(tasks.iter().map(|t| t.id.clone()).collect());
            counter!("batches_delegated_total").increment(1);
            {
                let mut state = self.state.lock();
                state.worker_count += tasks.len();
                state.status = SupervisorStatus::AwaitingWorkers;
            }

            let results = self.pool.run_many(tasks, &self.cancel).await;

            let mut state = self.state.lock();
            state.status = SupervisorStatus::Reflecting;
            for result in &results {
                state.notes.push(Note::from_worker(result));
            }
        }
    }
}
