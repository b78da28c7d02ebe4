//! Delegated task records and their status lifecycle.
//!
//! A task moves through exactly one transition sequence:
//! `Pending → Running → {Completed | Failed | Cancelled}`. Terminal
//! states never transition again; illegal moves are rejected rather
//! than silently applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::TaskId;

/// Status of a delegated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but not yet claimed by a worker.
    Pending,
    /// Claimed by a worker session.
    Running,
    /// Worker produced a result.
    Completed,
    /// Worker hit a fatal error.
    Failed,
    /// Run was cancelled before the worker finished.
    Cancelled,
}

impl TaskStatus {
    /// Whether this status ends the task's lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether `next` is a legal successor of `self`.
    fn allows(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Running | Self::Cancelled),
            Self::Running => next.is_terminal(),
            _ => false,
        }
    }
}

/// Rejected status transition.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal task transition {from:?} -> {to:?}")]
pub struct IllegalTransition {
    /// Status the task was in.
    pub from: TaskStatus,
    /// Status that was requested.
    pub to: TaskStatus,
}

/// One delegated unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task id.
    pub id: TaskId,
    /// What the worker should accomplish.
    pub instructions: String,
    /// Id of the task (or run) this was decomposed from, if any.
    pub parent_id: Option<TaskId>,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a pending task with a fresh id.
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            instructions: instructions.into(),
            parent_id: None,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Create a pending task decomposed from a parent.
    pub fn child_of(parent: &TaskId, instructions: impl Into<String>) -> Self {
        let mut task = Self::new(instructions);
        task.parent_id = Some(parent.clone());
        task
    }

    /// Advance the status, rejecting illegal moves.
    pub fn advance(&mut self, next: TaskStatus) -> Result<(), IllegalTransition> {
        if !self.status.allows(next) {
            return Err(IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
