//! Run-scoped event broadcasting.
//!
//! [`EventEmitter`] owns one broadcast channel per engine and hands out
//! subscriptions; [`EventEmitter::for_run`] binds it to a run so the
//! supervisor and workers emit through typed helpers instead of
//! assembling [`RunEvent`]s by hand. Emission never awaits; slow
//! receivers lag and drop events rather than blocking the run.

use tokio::sync::broadcast;

use foreman_core::events::{BaseEvent, RunEvent};
use foreman_core::ids::{RunId, TaskId};
use foreman_core::task::TaskStatus;

const CHANNEL_CAPACITY: usize = 1024;

/// Broadcast channel for run lifecycle events.
pub struct EventEmitter {
    tx: broadcast::Sender<RunEvent>,
}

impl EventEmitter {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.tx.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Bind the channel to one run. Every event sent through the
    /// returned handle carries that run's id and a fresh timestamp.
    pub fn for_run(&self, run_id: RunId) -> RunEmitter {
        RunEmitter {
            tx: self.tx.clone(),
            run_id,
        }
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Emitting handle for a single run, cloned into the supervisor and
/// every worker session.
#[derive(Clone)]
pub struct RunEmitter {
    tx: broadcast::Sender<RunEvent>,
    run_id: RunId,
}

impl RunEmitter {
    /// Run this handle is bound to.
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    fn send(&self, event: RunEvent) {
        // Zero subscribers is normal; the engine never requires listeners.
        let _ = self.tx.send(event);
    }

    fn base(&self) -> BaseEvent {
        BaseEvent::now(&self.run_id)
    }

    /// The request was accepted and work is starting.
    pub fn run_started(&self, request: &str) {
        self.send(RunEvent::RunStarted {
            base: self.base(),
            request: request.to_owned(),
        });
    }

    /// The supervisor began a coordination iteration.
    pub fn iteration_started(&self, iteration: u32) {
        self.send(RunEvent::IterationStarted {
            base: self.base(),
            iteration,
        });
    }

    /// A batch of tasks was delegated.
    pub fn batch_delegated(&self, task_ids: Vec<TaskId>) {
        self.send(RunEvent::BatchDelegated {
            base: self.base(),
            task_ids,
        });
    }

    /// A worker session claimed its task.
    pub fn worker_started(&self, task_id: &TaskId) {
        self.send(RunEvent::WorkerStarted {
            base: self.base(),
            task_id: task_id.clone(),
        });
    }

    /// A worker invoked a tool.
    pub fn tool_invoked(&self, task_id: &TaskId, tool: &str, is_error: bool) {
        self.send(RunEvent::ToolInvoked {
            base: self.base(),
            task_id: task_id.clone(),
            tool: tool.to_owned(),
            is_error,
        });
    }

    /// A worker session reached a terminal status.
    pub fn worker_finished(&self, task_id: &TaskId, status: TaskStatus, degraded: bool) {
        self.send(RunEvent::WorkerFinished {
            base: self.base(),
            task_id: task_id.clone(),
            status,
            degraded,
        });
    }

    /// The run produced its final report.
    pub fn run_finished(&self, iterations_used: u32, timed_out: bool) {
        self.send(RunEvent::RunFinished {
            base: self.base(),
            iterations_used,
            timed_out,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_emitter(emitter: &EventEmitter) -> RunEmitter {
        emitter.for_run(RunId::from_raw("r1"))
    }

    #[test]
    fn emitting_without_subscribers_is_fine() {
        let emitter = EventEmitter::new();
        run_emitter(&emitter).run_started("q");
        assert_eq!(emitter.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn helpers_stamp_run_id_and_tag() {
        let emitter = EventEmitter::new();
        let mut rx = emitter.subscribe();

        run_emitter(&emitter).iteration_started(2);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "iteration_started");
        assert_eq!(event.run_id().as_str(), "r1");
    }

    #[tokio::test]
    async fn worker_finished_carries_status_and_flag() {
        let emitter = EventEmitter::new();
        let mut rx = emitter.subscribe();

        run_emitter(&emitter).worker_finished(&TaskId::from_raw("t1"), TaskStatus::Failed, true);

        match rx.recv().await.unwrap() {
            RunEvent::WorkerFinished {
                task_id,
                status,
                degraded,
                ..
            } => {
                assert_eq!(task_id.as_str(), "t1");
                assert_eq!(status, TaskStatus::Failed);
                assert!(degraded);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn multiple_subscribers_all_receive() {
        let emitter = EventEmitter::new();
        let mut rx1 = emitter.subscribe();
        let mut rx2 = emitter.subscribe();
        assert_eq!(emitter.subscriber_count(), 2);

        run_emitter(&emitter).run_finished(3, false);
        assert_eq!(rx1.recv().await.unwrap().event_type(), "run_finished");
        assert_eq!(rx2.recv().await.unwrap().event_type(), "run_finished");
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let emitter = EventEmitter::new();
        let events = run_emitter(&emitter);
        events.run_started("q");

        let mut rx = emitter.subscribe();
        events.run_finished(1, false);

        assert_eq!(rx.recv().await.unwrap().event_type(), "run_finished");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn subscriber_count_tracks_drops() {
        let emitter = EventEmitter::new();
        let rx = emitter.subscribe();
        assert_eq!(emitter.subscriber_count(), 1);
        drop(rx);
        assert_eq!(emitter.subscriber_count(), 0);
    }
}
