//! Run requests, outcomes, and journal records.
//!
//! `RunRequest` is what the transport layer hands in. A run ends with either
//! an outcome (`PipelineOutcome` / `AgentOutcome`) or a `RunFailure`, never
//! with a half-built state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AutobookError, ErrorKind},
    message::{Message, Role},
    state::ConversationState,
};

/// Unique identifier for a single run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub uuid::Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input for the linear pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub user_request: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// History persisted by the caller from earlier runs.
    #[serde(default)]
    pub conversation_history: Vec<Message>,
}

impl PipelineRequest {
    pub fn new(user_request: impl Into<String>) -> Self {
        Self { user_request: user_request.into(), user_id: None, conversation_history: Vec::new() }
    }
}

/// Input for the tool-calling agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl AgentRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages, user_id: None }
    }

    /// The latest human utterance, if any.
    pub fn latest_human(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Human)
            .map(|m| m.content.as_str())
    }
}

/// Either request shape accepted by the run entry point.
///
/// `{ "user_request": … }` selects the pipeline, `{ "messages": [...] }`
/// selects the agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunRequest {
    Pipeline(PipelineRequest),
    Agent(AgentRequest),
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// A booking was confirmed, or the agent yielded a final answer.
    Completed,
    /// The pipeline stopped at the clarification step to wait for the user.
    NeedsClarification,
    /// The agent/tool cycle exceeded its bound.
    LoopBudgetExceeded,
    /// Any other fatal error.
    Failed,
}

/// Structured failure surfaced to the caller in place of a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl RunFailure {
    /// The terminal status a failure of this kind maps to.
    pub fn status(&self) -> RunStatus {
        match self.kind {
            ErrorKind::LoopBudgetExceeded => RunStatus::LoopBudgetExceeded,
            _ => RunStatus::Failed,
        }
    }
}

impl From<&AutobookError> for RunFailure {
    fn from(err: &AutobookError) -> Self {
        Self { kind: err.kind(), message: err.to_string() }
    }
}

/// The result of a completed pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub run_id: RunId,
    pub status: RunStatus,
    pub state: ConversationState,
}

/// The result of a completed agent-loop run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub run_id: RunId,
    pub status: RunStatus,
    pub history: Vec<Message>,
    /// How many times the oracle was asked to decide.
    pub agent_steps: u32,
    /// How many agent→tools→agent cycles ran.
    pub tool_round_trips: u32,
}

impl AgentOutcome {
    /// The final assistant reply, if the run ended with one.
    pub fn reply(&self) -> Option<&str> {
        self.history
            .last()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

/// The outcome of a run started from a `RunRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RunOutcome {
    Pipeline(PipelineOutcome),
    Agent(AgentOutcome),
}

impl RunOutcome {
    pub fn status(&self) -> RunStatus {
        match self {
            RunOutcome::Pipeline(o) => o.status,
            RunOutcome::Agent(o) => o.status,
        }
    }

    /// The text to show the user for this turn.
    pub fn reply(&self) -> Option<&str> {
        match self {
            RunOutcome::Pipeline(o) => o.state.confirmation.as_deref(),
            RunOutcome::Agent(o) => o.reply(),
        }
    }
}

/// An immutable record of one applied step, written to the step journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub run_id: String,
    /// Position of the step within its run, starting at 0.
    pub step: u64,
    /// Graph node name (e.g. "retrieve", "agent", "tools").
    pub node: String,
    /// Fields written and messages appended by this step.
    pub summary: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}
