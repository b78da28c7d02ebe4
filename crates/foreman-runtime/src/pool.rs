//! Semaphore-gated parallel execution of worker sessions.
//!
//! Every delegated task gets its own spawned session; a shared
//! [`Semaphore`] admits at most `concurrency_limit` of them at once
//! while the rest wait in FIFO order. One batch is joined as a unit,
//! and a sibling failing or being cancelled never tears down the
//! others: each slot always resolves to a [`WorkerResult`].

use std::sync::Arc;

use metrics::gauge;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use foreman_core::task::Task;
use foreman_llm::client::ReasoningClient;
use foreman_tools::registry::ToolRegistry;

use crate::config::OrchestrationConfig;
use crate::emitter::RunEmitter;
use crate::types::WorkerResult;
use crate::worker::WorkerSession;

/// Bounded pool that fans a batch of tasks out to worker sessions.
pub struct WorkerPool {
    client: Arc<dyn ReasoningClient>,
    registry: Arc<ToolRegistry>,
    events: RunEmitter,
    config: OrchestrationConfig,
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    /// Pool admitting at most `config.concurrency_limit` concurrent
    /// sessions. The semaphore lives for the whole run, so the limit
    /// holds across batches, not just within one.
    pub fn new(
        client: Arc<dyn ReasoningClient>,
        registry: Arc<ToolRegistry>,
        events: RunEmitter,
        config: OrchestrationConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.concurrency_limit));
        Self {
            client,
            registry,
            events,
            config,
            semaphore,
        }
    }

    /// Run one batch to completion and return results in task order.
    ///
    /// Tasks still waiting for a permit when `cancel` fires resolve to
    /// cancelled results without ever starting a session.
    pub async fn run_many(&self, tasks: Vec<Task>, cancel: &CancellationToken) -> Vec<WorkerResult> {
        debug!(batch_size = tasks.len(), "dispatching worker batch");

        let mut handles: Vec<(foreman_core::ids::TaskId, JoinHandle<WorkerResult>)> =
            Vec::with_capacity(tasks.len());
        for task in tasks {
            let task_id = task.id.clone();
            let handle = self.spawn_one(task, cancel.clone());
            handles.push((task_id, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (task_id, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(err) => {
                    warn!(task_id = %task_id, error = %err, "worker task aborted");
                    results.push(WorkerResult::failed(
                        task_id,
                        format!("worker task aborted: {err}"),
                    ));
                }
            }
        }
        results
    }

    fn spawn_one(&self, task: Task, cancel: CancellationToken) -> JoinHandle<WorkerResult> {
        let session = WorkerSession::new(
            Arc::clone(&self.client),
            Arc::clone(&self.registry),
            self.events.clone(),
            self.config.per_worker_tool_call_cap,
            self.config.compression_budget,
            self.config.retry.clone(),
            cancel.clone(),
        );
        let semaphore = Arc::clone(&self.semaphore);

        tokio::spawn(async move {
            let task_id = task.id.clone();
            let permit = tokio::select! {
                permit = semaphore.acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(err) => {
                        return WorkerResult::failed(
                            task_id,
                            format!("admission gate closed: {err}"),
                        );
                    }
                },
                () = cancel.cancelled() => {
                    debug!(task_id = %task_id, "cancelled while queued");
                    return WorkerResult::cancelled(task_id, String::new());
                }
            };

            gauge!("workers_active").increment(1.0);
            let result = session.run(task).await;
            gauge!("workers_active").decrement(1.0);
            drop(permit);
            result
        })
    }
}
