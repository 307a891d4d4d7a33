//! Pipeline step functions.
//!
//! Each step reads the current state and returns a `StateDelta`; none of
//! them mutate state. The executor applies the delta and journals it.

use tracing::{debug, warn};

use autobook_contracts::{
    error::{AutobookError, AutobookResult},
    limits::RunLimits,
    message::Message,
    state::{ConversationState, NextAction, StateDelta},
};

use crate::{
    events::EventSink,
    oracle::{OracleReply, OracleRequest, Purpose, TokenSink},
    prompts,
    retry::{call_with_deadline, call_with_deadline_while},
    traits::{Oracle, Retriever},
};

/// The collaborators a step may call, borrowed from the executor for one run.
pub struct StepContext<'a> {
    pub oracle: &'a dyn Oracle,
    pub retriever: &'a dyn Retriever,
    pub limits: &'a RunLimits,
    pub events: &'a EventSink,
}

impl StepContext<'_> {
    /// Send one prompt to the oracle under the oracle deadline.
    ///
    /// `visible` selects whether generated tokens reach the event stream.
    /// A visible attempt that fails after streaming any token is not
    /// retried.
    pub(crate) async fn ask(&self, request: OracleRequest, visible: bool) -> AutobookResult<OracleReply> {
        let tokens = if visible { self.events.tokens() } else { TokenSink::muted() };
        let purpose = request.purpose;
        let reply = call_with_deadline_while(
            "oracle",
            self.limits.oracle_timeout(),
            self.limits,
            || !tokens.has_streamed(),
            || self.oracle.respond(&request, &tokens),
        )
        .await?;
        debug!(?purpose, calls = reply.tool_calls.len(), "oracle replied");
        Ok(reply)
    }

    /// Run one knowledge search under the retrieval deadline.
    pub(crate) async fn search(&self, query: &str) -> AutobookResult<String> {
        call_with_deadline("retrieval", self.limits.retrieval_timeout(), self.limits, || {
            self.retriever.search(query)
        })
        .await
    }
}

/// Record the incoming request as a human message.
pub fn input(state: &ConversationState) -> StateDelta {
    StateDelta::default().append(Message::human(state.user_request.clone()))
}

/// Search the knowledge base with the user's request.
pub async fn retrieve(ctx: &StepContext<'_>, state: &ConversationState) -> AutobookResult<StateDelta> {
    let findings = ctx.search(&state.user_request).await?;
    Ok(StateDelta::default().findings(findings))
}

/// Decide between scheduling and clarification.
///
/// An unrecognized decision falls back to `Clarify`.
pub async fn route(ctx: &StepContext<'_>, state: &ConversationState) -> AutobookResult<StateDelta> {
    let request = OracleRequest::new(
        Purpose::Route,
        prompts::routing(state),
        state.conversation_history.clone(),
    );
    let reply = ctx.ask(request, false).await?;

    let decision = match NextAction::parse(&reply.content) {
        Ok(decision) => decision,
        Err(e) => {
            warn!(error = %e, "falling back to CLARIFY");
            NextAction::Clarify
        }
    };
    Ok(StateDelta::default().next_action(decision))
}

/// Ask the user a clarifying question.
pub async fn clarify(ctx: &StepContext<'_>, state: &ConversationState) -> AutobookResult<StateDelta> {
    let request = OracleRequest::new(
        Purpose::Clarify,
        prompts::clarification(state),
        state.conversation_history.clone(),
    );
    let question = ctx.ask(request, true).await?.content;
    Ok(StateDelta::default()
        .confirmation(question.clone())
        .append(Message::assistant(question)))
}

/// Draft a booking proposal.
pub async fn schedule(ctx: &StepContext<'_>, state: &ConversationState) -> AutobookResult<StateDelta> {
    if state.research_findings.is_none() {
        return Err(AutobookError::StateViolation {
            reason: "schedule step ran before retrieval".to_string(),
        });
    }
    let request = OracleRequest::new(
        Purpose::Schedule,
        prompts::scheduling(state),
        state.conversation_history.clone(),
    );
    let proposal = ctx.ask(request, false).await?.content;
    Ok(StateDelta::default().schedule(proposal))
}

/// Turn the proposal into a confirmation message for the user.
pub async fn confirm(ctx: &StepContext<'_>, state: &ConversationState) -> AutobookResult<StateDelta> {
    let schedule = state.schedule.as_deref().ok_or_else(|| AutobookError::StateViolation {
        reason: "confirm step ran before schedule".to_string(),
    })?;
    let request = OracleRequest::new(
        Purpose::Confirm,
        prompts::confirmation(schedule),
        state.conversation_history.clone(),
    );
    let message = ctx.ask(request, true).await?.content;
    Ok(StateDelta::default()
        .confirmation(message.clone())
        .append(Message::assistant(message)))
}
