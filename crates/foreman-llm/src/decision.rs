//! Model directives as a closed tagged union.
//!
//! The model's chosen next action drives both state machines. Keeping
//! the union closed — with an explicit [`Decision::Unrecognized`]
//! branch for directives the engine does not know — keeps every match
//! total instead of parsing free-form text at each call site.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Registered tool name.
    pub name: String,
    /// JSON arguments for the tool.
    pub arguments: Value,
}

impl ToolRequest {
    /// Build a request.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Directive returned by one `infer` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// Invoke a tool and observe the result (worker level).
    ToolCall(ToolRequest),
    /// Fan out the listed topics to workers (supervisor level).
    Delegate {
        /// One instruction string per sub-task.
        topics: Vec<String>,
    },
    /// Record a reasoning note without spawning work.
    Reflect {
        /// The note to append.
        note: String,
    },
    /// The current goal is satisfied.
    Complete,
    /// A direct textual answer.
    TextAnswer {
        /// Answer text.
        text: String,
    },
    /// Directive the engine does not understand; carried verbatim so the
    /// state machines can fold it into an observation instead of failing.
    Unrecognized {
        /// Raw directive text.
        raw: String,
    },
}

impl Decision {
    /// Convenience constructor for a delegation.
    pub fn delegate<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Delegate {
            topics: topics.into_iter().map(Into::into).collect(),
        }
    }

    /// Convenience constructor for a reflection note.
    pub fn reflect(note: impl Into<String>) -> Self {
        Self::Reflect { note: note.into() }
    }

    /// Convenience constructor for a text answer.
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextAnswer { text: text.into() }
    }
}
