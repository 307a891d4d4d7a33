//! Conversation state and the delta-merge rules.
//!
//! The executor owns exactly one `ConversationState` per run. Steps never
//! mutate it; they return a `StateDelta` which the executor applies:
//!
//! - scalar fields are write-once per run; a second write is a
//!   `StateViolation`,
//! - `conversation_history` only grows at the tail.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AutobookError, AutobookResult},
    message::{Message, Role},
};

/// Personalization data keyed by attribute name.
pub type UserProfile = BTreeMap<String, String>;

/// The routing decision taken after retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NextAction {
    Schedule,
    Clarify,
}

impl NextAction {
    /// Parse a raw oracle reply. The text is trimmed and upper-cased before
    /// matching; anything other than the two tokens is an error.
    pub fn parse(raw: &str) -> AutobookResult<Self> {
        match raw.trim().to_uppercase().as_str() {
            "SCHEDULE" => Ok(NextAction::Schedule),
            "CLARIFY" => Ok(NextAction::Clarify),
            _ => Err(AutobookError::UnrecognizedRoutingDecision { output: raw.to_string() }),
        }
    }
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextAction::Schedule => f.write_str("SCHEDULE"),
            NextAction::Clarify => f.write_str("CLARIFY"),
        }
    }
}

/// The record threaded through every pipeline step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub user_request: String,
    #[serde(default)]
    pub user_profile: UserProfile,
    #[serde(default)]
    pub conversation_history: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_findings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<NextAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<String>,
}

impl ConversationState {
    /// Start a run: the request, the caller's prior history, and the profile
    /// looked up for the user. Every derived field starts empty.
    pub fn new(user_request: impl Into<String>, history: Vec<Message>, profile: UserProfile) -> Self {
        Self {
            user_request: user_request.into(),
            user_profile: profile,
            conversation_history: history,
            ..Default::default()
        }
    }

    /// Apply a step's delta.
    ///
    /// All write-once checks run before anything is written, so a rejected
    /// delta leaves the state untouched.
    pub fn apply(&mut self, delta: StateDelta) -> AutobookResult<()> {
        check_write_once("research_findings", &self.research_findings, &delta.research_findings)?;
        check_write_once("next_action", &self.next_action, &delta.next_action)?;
        check_write_once("schedule", &self.schedule, &delta.schedule)?;
        check_write_once("confirmation", &self.confirmation, &delta.confirmation)?;

        if delta.research_findings.is_some() {
            self.research_findings = delta.research_findings;
        }
        if delta.next_action.is_some() {
            self.next_action = delta.next_action;
        }
        if delta.schedule.is_some() {
            self.schedule = delta.schedule;
        }
        if delta.confirmation.is_some() {
            self.confirmation = delta.confirmation;
        }
        self.conversation_history.extend(delta.append);
        Ok(())
    }

    /// Count the assistant messages at or after `from` in the history.
    pub fn assistant_messages_since(&self, from: usize) -> usize {
        self.conversation_history
            .iter()
            .skip(from)
            .filter(|m| m.role == Role::Assistant)
            .count()
    }
}

fn check_write_once<T>(field: &str, current: &Option<T>, incoming: &Option<T>) -> AutobookResult<()> {
    if current.is_some() && incoming.is_some() {
        return Err(AutobookError::StateViolation {
            reason: format!("field '{field}' is write-once and was already set in this run"),
        });
    }
    Ok(())
}

/// A partial update returned by a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_findings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<NextAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<String>,
    /// Messages to append at the tail of the history, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub append: Vec<Message>,
}

impl StateDelta {
    pub fn findings(mut self, text: impl Into<String>) -> Self {
        self.research_findings = Some(text.into());
        self
    }

    pub fn next_action(mut self, action: NextAction) -> Self {
        self.next_action = Some(action);
        self
    }

    pub fn schedule(mut self, text: impl Into<String>) -> Self {
        self.schedule = Some(text.into());
        self
    }

    pub fn confirmation(mut self, text: impl Into<String>) -> Self {
        self.confirmation = Some(text.into());
        self
    }

    pub fn append(mut self, message: Message) -> Self {
        self.append.push(message);
        self
    }

    /// Names of the fields this delta writes, for logging and the journal.
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.research_findings.is_some() {
            fields.push("research_findings");
        }
        if self.next_action.is_some() {
            fields.push("next_action");
        }
        if self.schedule.is_some() {
            fields.push("schedule");
        }
        if self.confirmation.is_some() {
            fields.push("confirmation");
        }
        if !self.append.is_empty() {
            fields.push("conversation_history");
        }
        fields
    }
}

/// Check that `returned` extends `prior` and return only the new tail.
///
/// Used when a caller persists history between runs and receives a full
/// history back: anything other than the old sequence plus zero or more new
/// messages at the end means some party redefined history.
pub fn merge_history(prior: &[Message], returned: Vec<Message>) -> AutobookResult<Vec<Message>> {
    if returned.len() < prior.len() {
        return Err(AutobookError::StateViolation {
            reason: format!(
                "history shrank from {} to {} message(s)",
                prior.len(),
                returned.len()
            ),
        });
    }
    if let Some(idx) = prior.iter().zip(returned.iter()).position(|(a, b)| a != b) {
        return Err(AutobookError::StateViolation {
            reason: format!("history diverges from the prior sequence at message {idx}"),
        });
    }
    Ok(returned.into_iter().skip(prior.len()).collect())
}
