//! Oracle request and reply types.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use autobook_contracts::{
    action::{ActionSpec, ToolCallRequest},
    error::AutobookResult,
    event::RunEvent,
    message::Message,
};

use crate::events::EventSink;

/// What a prompt is for. Lets an oracle pick a model, temperature, or
/// canned answer per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Route,
    Clarify,
    Schedule,
    Confirm,
    Agent,
}

/// A structured prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRequest {
    pub purpose: Purpose,
    /// The rendered instruction for this step.
    pub instruction: String,
    /// Conversation so far.
    pub history: Vec<Message>,
    /// Actions the oracle may request. Empty outside agent mode.
    pub actions: Vec<ActionSpec>,
}

impl OracleRequest {
    pub fn new(purpose: Purpose, instruction: impl Into<String>, history: Vec<Message>) -> Self {
        Self { purpose, instruction: instruction.into(), history, actions: Vec::new() }
    }

    pub fn with_actions(mut self, actions: Vec<ActionSpec>) -> Self {
        self.actions = actions;
        self
    }
}

/// The oracle's answer: free text, action requests, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OracleReply {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,
}

impl OracleReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: content.into(), tool_calls: Vec::new() }
    }

    pub fn calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self { content: String::new(), tool_calls }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Where an oracle sends partial output while generating.
///
/// Muted for steps whose output is not shown to the user (routing,
/// scheduling).
///
/// Clones share one `streamed` flag, so a caller that hands a clone to the
/// oracle can still tell afterwards whether anything reached the client.
/// A call whose output has been streamed is never retried.
#[derive(Debug, Clone, Default)]
pub struct TokenSink {
    events: Option<EventSink>,
    /// Set once any chunk has been handed to the event stream.
    streamed: Arc<AtomicBool>,
}

impl TokenSink {
    pub(crate) fn new(events: EventSink) -> Self {
        Self { events: Some(events), streamed: Arc::default() }
    }

    pub fn muted() -> Self {
        Self::default()
    }

    /// Forward one chunk of output. Empty chunks are skipped.
    pub async fn token(&self, text: &str) -> AutobookResult<()> {
        match &self.events {
            Some(events) if !text.is_empty() => {
                self.streamed.store(true, Ordering::SeqCst);
                events.emit(RunEvent::Content { text: text.to_string() }).await
            }
            _ => Ok(()),
        }
    }

    /// True once any chunk has gone to the event stream. Always false for a
    /// muted sink.
    pub fn has_streamed(&self) -> bool {
        self.streamed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use autobook_contracts::event::RunEvent;

    use super::TokenSink;
    use crate::events::EventSink;

    #[tokio::test]
    async fn streamed_flag_is_shared_between_clones() {
        let (events, mut rx) = EventSink::channel(4);
        let sink = events.tokens();
        let handed_out = sink.clone();

        assert!(!sink.has_streamed());
        handed_out.token("").await.unwrap();
        assert!(!sink.has_streamed(), "empty chunks are not output");

        handed_out.token("Hello").await.unwrap();
        assert!(sink.has_streamed());
        assert_eq!(rx.recv().await, Some(RunEvent::Content { text: "Hello".to_string() }));
    }

    #[tokio::test]
    async fn muted_sink_never_streams() {
        let sink = TokenSink::muted();
        sink.token("hidden").await.unwrap();
        assert!(!sink.has_streamed());
    }
}
