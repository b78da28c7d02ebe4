//! Ordered conversation transcripts.
//!
//! A worker session accumulates [`Turn`]s as it reasons, acts, and
//! observes. The transcript is the unit that gets compressed into a
//! note before returning to the supervisor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The original request or an injected instruction.
    User,
    /// Model output (text or a tool request).
    Assistant,
    /// Observation returned by a tool invocation.
    Tool,
}

/// A tool request recorded on an assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedToolCall {
    /// Tool name as requested by the model.
    pub name: String,
    /// Arguments as requested by the model.
    pub arguments: Value,
}

/// One ordered transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Entry author.
    pub role: Role,
    /// Entry text.
    pub content: String,
    /// Tool requests attached to an assistant turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<RecordedToolCall>,
}

impl Turn {
    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// A plain assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// An assistant turn that requested a tool.
    pub fn assistant_tool_call(name: impl Into<String>, arguments: Value) -> Self {
        let name = name.into();
        Self {
            role: Role::Assistant,
            content: String::new(),
            tool_calls: vec![RecordedToolCall {
                name,
                arguments,
            }],
        }
    }

    /// A tool observation turn.
    pub fn observation(content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// Ordered list of turns for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transcript from an initial user instruction.
    pub fn from_instructions(instructions: impl Into<String>) -> Self {
        let mut t = Self::new();
        t.push(Turn::user(instructions));
        t
    }

    /// Append a turn.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns in order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the transcript has no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Flatten the transcript to role-prefixed text, one turn per line.
    ///
    /// This is the raw form handed to compression and to the
    /// deterministic truncation fallback.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::Tool => "tool",
            };
            if turn.content.is_empty() && !turn.tool_calls.is_empty() {
                for call in &turn.tool_calls {
                    out.push_str(&format!("{role}: [call {}({})]\n", call.name, call.arguments));
                }
            } else {
                out.push_str(&format!("{role}: {}\n", turn.content));
            }
        }
        out
    }
}
