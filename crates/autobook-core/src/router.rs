//! Transition rules for both graphs.

use std::fmt;

use autobook_contracts::{
    error::{AutobookError, AutobookResult},
    execution::RunStatus,
    limits::RunLimits,
    state::{ConversationState, NextAction},
};

/// A node of the linear pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineNode {
    Input,
    Retrieve,
    Route,
    Clarify,
    Schedule,
    Confirm,
}

impl PipelineNode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Retrieve => "retrieve",
            Self::Route => "route",
            Self::Clarify => "clarify",
            Self::Schedule => "schedule",
            Self::Confirm => "confirm",
        }
    }

    /// Whether this step's oracle output is shown to the user as it streams.
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Clarify | Self::Confirm)
    }
}

impl fmt::Display for PipelineNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the pipeline goes after a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Next(PipelineNode),
    End(RunStatus),
}

/// Evaluate the pipeline router after `node` has been applied.
///
/// The only conditional edge is after `Route`, which requires
/// `next_action` to be set.
pub fn next_pipeline_node(node: PipelineNode, state: &ConversationState) -> AutobookResult<Transition> {
    let transition = match node {
        PipelineNode::Input => Transition::Next(PipelineNode::Retrieve),
        PipelineNode::Retrieve => Transition::Next(PipelineNode::Route),
        PipelineNode::Route => match state.next_action {
            Some(NextAction::Schedule) => Transition::Next(PipelineNode::Schedule),
            Some(NextAction::Clarify) => Transition::Next(PipelineNode::Clarify),
            None => {
                return Err(AutobookError::StateViolation {
                    reason: "route step finished without a decision".to_string(),
                })
            }
        },
        PipelineNode::Schedule => Transition::Next(PipelineNode::Confirm),
        PipelineNode::Clarify => Transition::End(RunStatus::NeedsClarification),
        PipelineNode::Confirm => Transition::End(RunStatus::Completed),
    };
    Ok(transition)
}

/// Where the agent loop goes after an agent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentTransition {
    Finish,
    ExecuteTools,
}

/// The termination predicate.
///
/// `round_trips` counts tool executions completed so far in this run.
pub fn after_agent_step(pending_calls: usize, round_trips: u32, limits: &RunLimits) -> AutobookResult<AgentTransition> {
    if pending_calls == 0 {
        return Ok(AgentTransition::Finish);
    }
    if round_trips >= limits.max_round_trips {
        return Err(AutobookError::LoopBudgetExceeded { limit: limits.max_round_trips });
    }
    Ok(AgentTransition::ExecuteTools)
}

#[cfg(test)]
mod tests {
    use autobook_contracts::{
        error::AutobookError,
        execution::RunStatus,
        limits::RunLimits,
        state::{ConversationState, NextAction, UserProfile},
    };

    use super::*;

    fn state_with(decision: Option<NextAction>) -> ConversationState {
        let mut state = ConversationState::new("book", vec![], UserProfile::new());
        state.next_action = decision;
        state
    }

    #[test]
    fn route_forks_on_decision() {
        let schedule = next_pipeline_node(PipelineNode::Route, &state_with(Some(NextAction::Schedule))).unwrap();
        assert_eq!(schedule, Transition::Next(PipelineNode::Schedule));

        let clarify = next_pipeline_node(PipelineNode::Route, &state_with(Some(NextAction::Clarify))).unwrap();
        assert_eq!(clarify, Transition::Next(PipelineNode::Clarify));
    }

    #[test]
    fn route_without_decision_is_a_state_violation() {
        match next_pipeline_node(PipelineNode::Route, &state_with(None)) {
            Err(AutobookError::StateViolation { .. }) => {}
            other => panic!("expected StateViolation, got {:?}", other),
        }
    }

    #[test]
    fn clarify_and_confirm_are_terminal() {
        let state = state_with(None);
        assert_eq!(
            next_pipeline_node(PipelineNode::Clarify, &state).unwrap(),
            Transition::End(RunStatus::NeedsClarification)
        );
        assert_eq!(
            next_pipeline_node(PipelineNode::Confirm, &state).unwrap(),
            Transition::End(RunStatus::Completed)
        );
        assert_eq!(
            next_pipeline_node(PipelineNode::Schedule, &state).unwrap(),
            Transition::Next(PipelineNode::Confirm)
        );
    }

    #[test]
    fn no_calls_finishes_the_loop() {
        let limits = RunLimits::default();
        assert_eq!(after_agent_step(0, 5, &limits).unwrap(), AgentTransition::Finish);
        assert_eq!(after_agent_step(2, 0, &limits).unwrap(), AgentTransition::ExecuteTools);
    }

    #[test]
    fn budget_is_checked_before_executing_tools() {
        let limits = RunLimits { max_round_trips: 2, ..RunLimits::default() };
        assert_eq!(after_agent_step(1, 1, &limits).unwrap(), AgentTransition::ExecuteTools);
        assert_eq!(
            after_agent_step(1, 2, &limits).unwrap_err(),
            AutobookError::LoopBudgetExceeded { limit: 2 }
        );
    }
}
