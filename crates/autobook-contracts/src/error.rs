//! Runtime error types for the autobook run loop.
//!
//! All fallible operations return `AutobookResult<T>`. Three variants
//! (`UnknownAction`, `InvalidArguments`, `HandlerFailure`) are local to a
//! single tool call: the executor turns them into tool-result text and the
//! run continues. Every other variant ends the run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The unified error type for the autobook runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutobookError {
    /// The routing step received something other than `SCHEDULE` or `CLARIFY`.
    #[error("unrecognized routing decision: '{output}'")]
    UnrecognizedRoutingDecision { output: String },

    /// The oracle asked for an action the registry does not declare.
    #[error("unknown action '{name}'")]
    UnknownAction { name: String },

    /// Arguments for an action were missing or of the wrong type.
    #[error("invalid arguments for action '{action}': {reason}")]
    InvalidArguments { action: String, reason: String },

    /// The action's own domain logic reported a failure.
    #[error("action '{action}' failed: {reason}")]
    HandlerFailure { action: String, reason: String },

    /// A tool call request was not answered before the next agent step.
    #[error("tool call '{call_id}' has no matching tool result")]
    UnansweredToolCall { call_id: String },

    /// The agent/tool cycle ran past its configured bound.
    #[error("agent loop exceeded its budget of {limit} round trip(s)")]
    LoopBudgetExceeded { limit: u32 },

    /// The text-completion oracle errored.
    #[error("oracle unavailable: {reason}")]
    OracleUnavailable { reason: String },

    /// The retrieval collaborator errored.
    #[error("retrieval unavailable: {reason}")]
    RetrievalUnavailable { reason: String },

    /// An oracle, retrieval, or tool call did not finish before its deadline.
    #[error("{operation} timed out after {after_ms} ms")]
    Timeout { operation: String, after_ms: u64 },

    /// A step tried to rewrite state it does not own (second write to a
    /// write-once field, or a history that is not an extension of the old one).
    #[error("state violation: {reason}")]
    StateViolation { reason: String },

    /// The stream consumer disconnected while the run was still producing events.
    #[error("run cancelled: {reason}")]
    Cancelled { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Coarse classification of an `AutobookError`, stable across messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnrecognizedRoutingDecision,
    UnknownAction,
    InvalidArguments,
    HandlerFailure,
    UnansweredToolCall,
    LoopBudgetExceeded,
    OracleUnavailable,
    RetrievalUnavailable,
    Timeout,
    StateViolation,
    Cancelled,
    ConfigError,
}

impl AutobookError {
    /// The kind of this error, for structured failure reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnrecognizedRoutingDecision { .. } => ErrorKind::UnrecognizedRoutingDecision,
            Self::UnknownAction { .. } => ErrorKind::UnknownAction,
            Self::InvalidArguments { .. } => ErrorKind::InvalidArguments,
            Self::HandlerFailure { .. } => ErrorKind::HandlerFailure,
            Self::UnansweredToolCall { .. } => ErrorKind::UnansweredToolCall,
            Self::LoopBudgetExceeded { .. } => ErrorKind::LoopBudgetExceeded,
            Self::OracleUnavailable { .. } => ErrorKind::OracleUnavailable,
            Self::RetrievalUnavailable { .. } => ErrorKind::RetrievalUnavailable,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::StateViolation { .. } => ErrorKind::StateViolation,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::ConfigError { .. } => ErrorKind::ConfigError,
        }
    }

    /// True for errors confined to a single tool call. These become
    /// tool-result text instead of aborting the run.
    pub fn is_tool_local(&self) -> bool {
        matches!(
            self,
            Self::UnknownAction { .. } | Self::InvalidArguments { .. } | Self::HandlerFailure { .. }
        )
    }

    /// True for collaborator outages that a bounded retry may clear.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::OracleUnavailable { .. } | Self::RetrievalUnavailable { .. } | Self::Timeout { .. }
        )
    }
}

/// Convenience alias used throughout the autobook crates.
pub type AutobookResult<T> = Result<T, AutobookError>;
