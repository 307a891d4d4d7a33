//! Collaborator traits for the run loop.
//!
//! The executor only ever talks to the outside world through these:
//!
//! - `Oracle`:        text generation and action selection
//! - `Retriever`:     knowledge search
//! - `ActionHandler`: the side effect behind one registered action
//! - `ProfileStore`:  personalization lookup before a run starts
//! - `StepJournal`:   append-only record of every applied step

use async_trait::async_trait;

use autobook_contracts::{
    action::ActionArguments,
    error::AutobookResult,
    execution::StepRecord,
    state::UserProfile,
};

use crate::oracle::{OracleReply, OracleRequest, TokenSink};

/// The external text-completion capability.
///
/// Implementations may stream partial output through `tokens` as it is
/// generated; the full text must still be returned in the reply.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Answer one structured prompt.
    ///
    /// Errors should be reported as `AutobookError::OracleUnavailable`.
    async fn respond(&self, request: &OracleRequest, tokens: &TokenSink) -> AutobookResult<OracleReply>;
}

/// The knowledge search capability.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return findings for `query` as free text.
    ///
    /// An empty string is a valid answer. Calling twice with the same query
    /// must be safe. Errors should be `AutobookError::RetrievalUnavailable`.
    async fn search(&self, query: &str) -> AutobookResult<String>;
}

/// The side effect behind one registered action.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Run the action with arguments that already passed schema validation.
    ///
    /// Expected domain problems (a malformed date, a full calendar) should be
    /// returned as descriptive `Ok` text. `AutobookError::HandlerFailure` is
    /// for failures the oracle should hear about as "the action failed".
    async fn invoke(&self, arguments: &ActionArguments) -> AutobookResult<String>;
}

/// Personalization lookup.
pub trait ProfileStore: Send + Sync {
    /// Return the profile for `user_id`, or an empty map when none exists.
    fn load_profile(&self, user_id: &str) -> UserProfile;
}

/// The step journal: an append-only record of applied steps.
pub trait StepJournal: Send + Sync {
    /// Append one step record. Records are never modified afterwards.
    fn write(&self, record: &StepRecord) -> AutobookResult<()>;

    /// Mark a run as finished, whatever its status.
    fn finalize(&self, run_id: &str) -> AutobookResult<()>;
}

/// A profile store that knows nobody.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProfiles;

impl ProfileStore for NoProfiles {
    fn load_profile(&self, _user_id: &str) -> UserProfile {
        UserProfile::new()
    }
}

/// A journal that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullJournal;

impl StepJournal for NullJournal {
    fn write(&self, _record: &StepRecord) -> AutobookResult<()> {
        Ok(())
    }

    fn finalize(&self, _run_id: &str) -> AutobookResult<()> {
        Ok(())
    }
}
