//! Streaming event protocol.
//!
//! A streaming run emits `RunEvent`s on an ordered channel as steps start,
//! tokens arrive, and tool calls begin and end. The transport renders them
//! as server-sent-event frames with `to_sse_frame`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    action::{ActionArguments, ToolCallRequest},
    execution::{RunFailure, RunStatus},
};

/// One event in a run's live stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// A graph node began executing. Internal; has no transport frame.
    StepStart { step: String },

    /// A chunk of user-facing oracle output.
    Content { text: String },

    /// The oracle requested an action.
    ToolCall { call: ToolCallRequest },

    /// An action is about to run.
    ToolStart { call_id: String, tool_name: String, arguments: ActionArguments },

    /// An action finished; `output` is what goes back to the oracle.
    ToolEnd { call_id: String, tool_name: String, output: String },

    /// The run is over. Always the last event.
    End {
        status: RunStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confirmation: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        failure: Option<RunFailure>,
    },
}

impl RunEvent {
    /// The `type` tag this event serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            RunEvent::StepStart { .. } => "step_start",
            RunEvent::Content { .. } => "content",
            RunEvent::ToolCall { .. } => "tool_call",
            RunEvent::ToolStart { .. } => "tool_start",
            RunEvent::ToolEnd { .. } => "tool_end",
            RunEvent::End { .. } => "end",
        }
    }

    /// Render as a `data: <JSON>\n\n` frame.
    ///
    /// Returns `None` for `StepStart`, which is visible to in-process
    /// consumers only.
    pub fn to_sse_frame(&self) -> Option<String> {
        if matches!(self, RunEvent::StepStart { .. }) {
            return None;
        }
        let json = serde_json::to_value(self).unwrap_or(Value::Null);
        Some(format!("data: {json}\n\n"))
    }

    pub fn is_end(&self) -> bool {
        matches!(self, RunEvent::End { .. })
    }
}
