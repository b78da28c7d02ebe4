//! Run lifecycle events.
//!
//! Every stage of an orchestration run emits a [`RunEvent`] so callers
//! can observe progress without polling. Events are serde-tagged for
//! transport and carry a [`BaseEvent`] with the run id and timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{RunId, TaskId};
use crate::task::TaskStatus;

/// Common fields shared by all run events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseEvent {
    /// Run this event belongs to.
    pub run_id: RunId,
    /// Emission timestamp (UTC).
    pub timestamp: DateTime<Utc>,
}

impl BaseEvent {
    /// Base event stamped with the current time.
    pub fn now(run_id: &RunId) -> Self {
        Self {
            run_id: run_id.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Lifecycle event emitted during an orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// Orchestrator accepted the request and work is starting.
    RunStarted {
        /// Common fields.
        base: BaseEvent,
        /// The request being orchestrated.
        request: String,
    },
    /// Supervisor began a coordination iteration.
    IterationStarted {
        /// Common fields.
        base: BaseEvent,
        /// 1-based iteration number.
        iteration: u32,
    },
    /// Supervisor delegated a batch of tasks.
    BatchDelegated {
        /// Common fields.
        base: BaseEvent,
        /// Ids of the delegated tasks.
        task_ids: Vec<TaskId>,
    },
    /// A worker session claimed a task.
    WorkerStarted {
        /// Common fields.
        base: BaseEvent,
        /// Task being worked.
        task_id: TaskId,
    },
    /// A worker invoked a tool.
    ToolInvoked {
        /// Common fields.
        base: BaseEvent,
        /// Task on whose behalf the tool ran.
        task_id: TaskId,
        /// Tool name.
        tool: String,
        /// Whether the invocation returned an error observation.
        is_error: bool,
    },
    /// A worker session reached a terminal status.
    WorkerFinished {
        /// Common fields.
        base: BaseEvent,
        /// Task the worker held.
        task_id: TaskId,
        /// Terminal status.
        status: TaskStatus,
        /// Whether a safety cap forced the result.
        degraded: bool,
    },
    /// The run produced its final report.
    RunFinished {
        /// Common fields.
        base: BaseEvent,
        /// Supervisor iterations used.
        iterations_used: u32,
        /// Whether the overall timeout fired.
        timed_out: bool,
    },
}

impl RunEvent {
    /// Stable string tag for this event (matches the serde tag).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::IterationStarted { .. } => "iteration_started",
            Self::BatchDelegated { .. } => "batch_delegated",
            Self::WorkerStarted { .. } => "worker_started",
            Self::ToolInvoked { .. } => "tool_invoked",
            Self::WorkerFinished { .. } => "worker_finished",
            Self::RunFinished { .. } => "run_finished",
        }
    }

    /// Run this event belongs to.
    pub fn run_id(&self) -> &RunId {
        match self {
            Self::RunStarted { base, .. }
            | Self::IterationStarted { base, .. }
            | Self::BatchDelegated { base, .. }
            | Self::WorkerStarted { base, .. }
            | Self::ToolInvoked { base, .. }
            | Self::WorkerFinished { base, .. }
            | Self::RunFinished { base, .. } => &base.run_id,
        }
    }
}
