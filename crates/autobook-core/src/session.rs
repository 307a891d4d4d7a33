//! Multi-turn conversations on top of single runs.
//!
//! A run only sees the history it is handed. `Session` carries that history
//! from turn to turn and checks that each run extended it rather than
//! rewriting it.

use std::sync::Arc;

use autobook_contracts::{
    error::AutobookResult,
    execution::{AgentOutcome, AgentRequest, PipelineOutcome, PipelineRequest},
    message::Message,
    state::merge_history,
};

use crate::executor::Executor;

pub struct Session {
    executor: Arc<Executor>,
    user_id: Option<String>,
    history: Vec<Message>,
}

impl Session {
    pub fn new(executor: Arc<Executor>, user_id: Option<String>) -> Self {
        Self { executor, user_id, history: Vec::new() }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Send one turn through the pipeline.
    pub async fn send(&mut self, text: impl Into<String>) -> AutobookResult<PipelineOutcome> {
        let request = PipelineRequest {
            user_request: text.into(),
            user_id: self.user_id.clone(),
            conversation_history: self.history.clone(),
        };
        let outcome = self.executor.run_pipeline(request).await?;
        let tail = merge_history(&self.history, outcome.state.conversation_history.clone())?;
        self.history.extend(tail);
        Ok(outcome)
    }

    /// Send one turn through the agent loop.
    pub async fn ask(&mut self, text: impl Into<String>) -> AutobookResult<AgentOutcome> {
        let mut messages = self.history.clone();
        messages.push(Message::human(text));
        let request = AgentRequest { messages, user_id: self.user_id.clone() };
        let outcome = self.executor.run_agent(request).await?;
        let tail = merge_history(&self.history, outcome.history.clone())?;
        self.history.extend(tail);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use autobook_contracts::{
        action::ToolCallRequest,
        execution::RunStatus,
        limits::RunLimits,
        message::{Message, Role},
    };

    use super::Session;
    use crate::{
        executor::Executor,
        oracle::{OracleReply, Purpose},
        registry::ActionRegistry,
        testing::*,
        traits::ActionHandler,
    };

    #[tokio::test]
    async fn pipeline_turns_accumulate_history() {
        let oracle = MockOracle::default()
            .with_reply(Purpose::Route, "CLARIFY")
            .with_reply(Purpose::Clarify, "Which day suits you?");
        let exec = Arc::new(Executor::new(
            Arc::new(oracle),
            Arc::new(StubRetriever::new("")),
            Arc::new(ActionRegistry::new()),
            RunLimits::default(),
        ));
        let mut session = Session::new(exec, Some("default_user".to_string()));

        let first = session.send("I need a checkup").await.unwrap();
        assert_eq!(first.status, RunStatus::NeedsClarification);
        assert_eq!(session.history().len(), 2);

        session.send("Tuesday").await.unwrap();
        let contents: Vec<&str> = session.history().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["I need a checkup", "Which day suits you?", "Tuesday", "Which day suits you?"]
        );
    }

    #[tokio::test]
    async fn agent_turns_keep_tool_results() {
        let retriever = Arc::new(StubRetriever::new("Open 9-5 weekdays."));
        let oracle = MockOracle::default().with_agent_replies(vec![
            OracleReply::calls(vec![ToolCallRequest::new(
                "search_knowledge_base",
                json!({ "query": "hours" }),
                "c1",
            )]),
            OracleReply::text("We are open 9-5 on weekdays."),
            OracleReply::text("You're welcome!"),
        ]);
        let registry = registry_with(vec![(
            search_spec(),
            Arc::new(SearchHandler(retriever.clone())) as Arc<dyn ActionHandler>,
        )]);
        let exec = Arc::new(Executor::new(Arc::new(oracle), retriever, Arc::new(registry), RunLimits::default()));
        let mut session = Session::new(exec, None);

        session.ask("When are you open?").await.unwrap();
        let second = session.ask("Thanks").await.unwrap();

        assert_eq!(second.reply(), Some("You're welcome!"));
        let roles: Vec<Role> = session.history().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::Human, Role::Tool, Role::Assistant, Role::Human, Role::Assistant]
        );
        assert_eq!(session.history()[3], Message::human("Thanks"));
    }
}
