//! Dialogue messages.
//!
//! A `Message` is one turn in the conversation history. Messages are created
//! by the step that contributes the turn and never change after they are
//! appended.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who produced a message.
///
/// Serialized in lowercase. `user` and `ai` are accepted on input so that
/// histories produced by older clients still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "user")]
    Human,
    #[serde(alias = "ai")]
    Assistant,
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Human => "human",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        f.write_str(s)
    }
}

/// A single unit of dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the turn. Older clients send this field as `type`.
    #[serde(alias = "type")]
    pub role: Role,
    /// The text of the turn.
    pub content: String,
    /// For tool messages: the `call_id` of the request this result answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// For tool messages: the action that produced the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Self { role: Role::Human, content: content.into(), call_id: None, tool_name: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), call_id: None, tool_name: None }
    }

    /// A tool result answering the request identified by `call_id`.
    pub fn tool_result(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            call_id: Some(call_id.into()),
            tool_name: Some(tool_name.into()),
        }
    }

    /// Return true if this is a tool result answering `call_id`.
    pub fn answers(&self, call_id: &str) -> bool {
        self.role == Role::Tool && self.call_id.as_deref() == Some(call_id)
    }
}
