//! Scenario 3: Agent Answers From the Knowledge Base
//!
//! The oracle asks for one knowledge search, reads the result, and answers
//! in plain text. The run takes two agent steps and one tool round trip.

use std::sync::Arc;

use serde_json::json;

use autobook_contracts::{
    action::ToolCallRequest,
    error::AutobookResult,
    execution::{AgentOutcome, AgentRequest},
    message::Message,
};
use autobook_core::OracleReply;

use crate::{deployment::Clinic, oracle::ScriptedOracle};

pub const QUESTION: &str = "What are the clinic's hours?";
pub const ANSWER: &str = "The clinic is open 9-5 weekdays.";

pub fn oracle() -> ScriptedOracle {
    let search = ToolCallRequest::new("search_knowledge_base", json!({ "query": "clinic hours" }), "call_hours");
    ScriptedOracle::new()
        .agent_turn(OracleReply::calls(vec![search]))
        .agent_turn(OracleReply::text(ANSWER))
}

pub async fn execute(clinic: &Clinic) -> AutobookResult<AgentOutcome> {
    let executor = clinic.executor(Arc::new(oracle()))?;
    executor.run_agent(AgentRequest::new(vec![Message::human(QUESTION)])).await
}

pub async fn run_scenario() -> AutobookResult<()> {
    println!("=== Scenario 3: Agent Answers From the Knowledge Base ===");
    println!();

    let clinic = Clinic::load()?;
    let outcome = execute(&clinic).await?;

    println!("  Question:        {}", QUESTION);
    println!("  Agent steps:     {}", outcome.agent_steps);
    println!("  Round trips:     {}", outcome.tool_round_trips);
    println!("  Reply:           {}", outcome.reply().unwrap_or("-"));
    println!("  History:");
    super::print_history(&outcome.history);
    super::print_journal(&clinic, &outcome.run_id.to_string());
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use autobook_contracts::{execution::RunStatus, message::Role};

    use super::*;

    #[tokio::test]
    async fn answers_after_one_search() {
        let clinic = Clinic::load().unwrap();
        let outcome = execute(&clinic).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.agent_steps, 2);
        assert_eq!(outcome.tool_round_trips, 1);

        let roles: Vec<Role> = outcome.history.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Human, Role::Tool, Role::Assistant]);
        assert_eq!(outcome.reply(), Some(ANSWER));
    }

    #[tokio::test]
    async fn tool_result_carries_retrieved_hours() {
        let clinic = Clinic::load().unwrap();
        let outcome = execute(&clinic).await.unwrap();

        let tool = &outcome.history[1];
        assert!(tool.answers("call_hours"));
        assert_eq!(tool.tool_name.as_deref(), Some("search_knowledge_base"));
        assert!(tool.content.contains("9:00 AM to 5:00 PM"));
    }

    #[tokio::test]
    async fn journal_records_agent_and_tool_steps() {
        let clinic = Clinic::load().unwrap();
        let outcome = execute(&clinic).await.unwrap();

        let log = clinic.journal.export_run(&outcome.run_id.to_string());
        let nodes: Vec<&str> = log.entries.iter().map(|e| e.record.node.as_str()).collect();
        assert_eq!(nodes, vec!["agent", "tools", "agent"]);
        assert!(log.finalized);
    }
}
