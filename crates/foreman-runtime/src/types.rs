//! Result and state types for the coordination layer.

use serde::{Deserialize, Serialize};

use foreman_core::ids::TaskId;
use foreman_core::task::TaskStatus;

/// Outcome of one worker session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResult {
    /// Task the session held.
    pub task_id: TaskId,
    /// Short note for the supervisor's context.
    pub compressed_summary: String,
    /// Full rendered transcript, kept for the final result.
    pub raw_notes: String,
    /// Terminal task status.
    pub status: TaskStatus,
    /// Whether a safety cap (tool-call cap, compression fallback)
    /// shaped this result.
    pub degraded: bool,
    /// Captured failure reason, present when `status` is `Failed`.
    pub error: Option<String>,
}

impl WorkerResult {
    /// A failed result with a captured reason.
    pub fn failed(task_id: TaskId, reason: impl Into<String>) -> Self {
        Self {
            task_id,
            compressed_summary: String::new(),
            raw_notes: String::new(),
            status: TaskStatus::Failed,
            degraded: false,
            error: Some(reason.into()),
        }
    }

    /// A cancelled result, keeping whatever transcript existed.
    pub fn cancelled(task_id: TaskId, raw_notes: String) -> Self {
        Self {
            task_id,
            compressed_summary: String::new(),
            raw_notes,
            status: TaskStatus::Cancelled,
            degraded: false,
            error: None,
        }
    }
}

/// Provenance of a supervisor note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    /// Compressed summary from a completed worker.
    Finding,
    /// A worker failed; the note carries the reason.
    Failure,
    /// A worker was cancelled before finishing.
    Cancellation,
    /// Supervisor reasoning appended without spawning work.
    Reflection,
}

impl NoteKind {
    /// Stable label used when rendering notes into a transcript.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Finding => "finding",
            Self::Failure => "failure",
            Self::Cancellation => "cancellation",
            Self::Reflection => "reflection",
        }
    }
}

/// One entry in the supervisor's accumulated context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Where the note came from.
    pub kind: NoteKind,
    /// Task that produced it, if any.
    pub task_id: Option<TaskId>,
    /// Note text.
    pub text: String,
    /// Whether a safety cap shaped the underlying result.
    pub degraded: bool,
}

impl Note {
    /// Build a note from a worker result.
    pub fn from_worker(result: &WorkerResult) -> Self {
        match result.status {
            TaskStatus::Failed => Self {
                kind: NoteKind::Failure,
                task_id: Some(result.task_id.clone()),
                text: result
                    .error
                    .clone()
                    .unwrap_or_else(|| "unspecified worker failure".to_owned()),
                degraded: result.degraded,
            },
            TaskStatus::Cancelled => Self {
                kind: NoteKind::Cancellation,
                task_id: Some(result.task_id.clone()),
                text: "worker cancelled before completion".to_owned(),
                degraded: result.degraded,
            },
            _ => Self {
                kind: NoteKind::Finding,
                task_id: Some(result.task_id.clone()),
                text: result.compressed_summary.clone(),
                degraded: result.degraded,
            },
        }
    }

    /// A reflection note.
    pub fn reflection(text: impl Into<String>) -> Self {
        Self {
            kind: NoteKind::Reflection,
            task_id: None,
            text: text.into(),
            degraded: false,
        }
    }

    /// A finding authored by the supervisor itself (direct answer path).
    pub fn finding(text: impl Into<String>) -> Self {
        Self {
            kind: NoteKind::Finding,
            task_id: None,
            text: text.into(),
            degraded: false,
        }
    }
}

/// Where the supervisor currently is in its coordination loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorStatus {
    /// Deciding the next move.
    Planning,
    /// Creating tasks for a delegation.
    Delegating,
    /// Blocked on the current batch.
    AwaitingWorkers,
    /// Folding results back into context.
    Reflecting,
    /// Producing the final answer.
    Completing,
    /// Loop finished.
    Done,
}

/// Run-scoped coordination state, mutated only by the supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorState {
    /// The request being orchestrated.
    pub brief: String,
    /// Ordered accumulated notes.
    pub notes: Vec<Note>,
    /// Coordination passes so far; monotonically increasing, capped.
    pub iteration_count: u32,
    /// Current loop position.
    pub status: SupervisorStatus,
    /// Worker sessions spawned so far.
    pub worker_count: usize,
    /// Whether a cap or coordination failure forced termination.
    pub degraded: bool,
}

impl SupervisorState {
    /// Fresh state for a brief.
    pub fn new(brief: impl Into<String>) -> Self {
        Self {
            brief: brief.into(),
            notes: Vec::new(),
            iteration_count: 0,
            status: SupervisorStatus::Planning,
            worker_count: 0,
            degraded: false,
        }
    }
}

/// Final, caller-visible outcome of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResult {
    /// Synthesized report.
    pub final_report: String,
    /// Every note accumulated during the run.
    pub notes: Vec<Note>,
    /// Supervisor iterations consumed.
    pub iterations_used: u32,
    /// Worker sessions spawned.
    pub worker_count: usize,
    /// Whether the overall timeout forced shutdown.
    pub timed_out: bool,
    /// Whether any safety cap forced termination instead of a natural
    /// completion signal.
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(summary: &str) -> WorkerResult {
        WorkerResult {
            task_id: TaskId::from_raw("t1"),
            compressed_summary: summary.into(),
            raw_notes: String::new(),
            status: TaskStatus::Completed,
            degraded: false,
            error: None,
        }
    }

    #[test]
    fn finding_note_from_completed_worker() {
        let note = Note::from_worker(&completed("summary text"));
        assert_eq!(note.kind, NoteKind::Finding);
        assert_eq!(note.text, "summary text");
        assert_eq!(note.task_id.as_ref().map(TaskId::as_str), Some("t1"));
    }

    #[test]
    fn failure_note_carries_reason() {
        let result = WorkerResult::failed(TaskId::from_raw("t2"), "provider refused");
        let note = Note::from_worker(&result);
        assert_eq!(note.kind, NoteKind::Failure);
        assert_eq!(note.text, "provider refused");
    }

    #[test]
    fn cancellation_note_kind() {
        let result = WorkerResult::cancelled(TaskId::from_raw("t3"), String::new());
        assert_eq!(Note::from_worker(&result).kind, NoteKind::Cancellation);
    }

    #[test]
    fn degraded_flag_propagates_to_note() {
        let mut result = completed("capped summary");
        result.degraded = true;
        assert!(Note::from_worker(&result).degraded);
    }

    #[test]
    fn fresh_state_starts_planning() {
        let state = SupervisorState::new("brief");
        assert_eq!(state.status, SupervisorStatus::Planning);
        assert_eq!(state.iteration_count, 0);
        assert!(state.notes.is_empty());
    }
}
