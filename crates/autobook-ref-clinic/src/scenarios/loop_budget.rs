//! Scenario 5: Loop Budget
//!
//! A misbehaving oracle asks for a knowledge search on every turn. The
//! executor stops the run once the configured number of round trips is
//! spent instead of looping forever.

use std::sync::Arc;

use serde_json::json;

use autobook_contracts::{
    action::ToolCallRequest,
    error::{AutobookError, AutobookResult},
    execution::{AgentRequest, RunFailure},
    message::Message,
};
use autobook_core::OracleReply;

use crate::{deployment::Clinic, oracle::ScriptedOracle};

pub const QUESTION: &str = "Tell me everything about the clinic.";

pub fn oracle() -> ScriptedOracle {
    // Every turn reuses the same call id; the loop re-keys duplicates only
    // within one turn, so each round trip answers "call_again" once.
    let search = ToolCallRequest::new("search_knowledge_base", json!({ "query": "clinic" }), "call_again");
    ScriptedOracle::new().repeat_agent(OracleReply::calls(vec![search]))
}

/// Run the agent and return the error it stopped with.
pub async fn execute(clinic: &Clinic) -> AutobookResult<AutobookError> {
    let executor = clinic.executor(Arc::new(oracle()))?;
    match executor.run_agent(AgentRequest::new(vec![Message::human(QUESTION)])).await {
        Err(err) => Ok(err),
        Ok(outcome) => Err(AutobookError::StateViolation {
            reason: format!("agent run {} ended without hitting its loop budget", outcome.run_id),
        }),
    }
}

pub async fn run_scenario() -> AutobookResult<()> {
    println!("=== Scenario 5: Loop Budget ===");
    println!();

    let clinic = Clinic::load()?;
    let err = execute(&clinic).await?;
    let failure = RunFailure::from(&err);

    println!("  Question:        {}", QUESTION);
    println!("  Bound:           {} round trip(s)", clinic.config.limits.max_round_trips);
    println!("  Stopped with:    {}", err);
    println!("  Status:          {:?}", failure.status());
    println!("  Journal entries: {}", clinic.journal.len());
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use autobook_contracts::{error::ErrorKind, execution::RunStatus};

    use super::*;

    #[tokio::test]
    async fn always_calling_oracle_hits_the_bound() {
        let clinic = Clinic::load().unwrap();
        let err = execute(&clinic).await.unwrap();

        match &err {
            AutobookError::LoopBudgetExceeded { limit } => assert_eq!(*limit, 5),
            other => panic!("expected LoopBudgetExceeded, got {:?}", other),
        }
        assert_eq!(err.kind(), ErrorKind::LoopBudgetExceeded);
        assert_eq!(RunFailure::from(&err).status(), RunStatus::LoopBudgetExceeded);
    }

    #[tokio::test]
    async fn every_completed_round_trip_is_journaled() {
        let clinic = Clinic::load().unwrap();
        execute(&clinic).await.unwrap();

        let tools = clinic.journal.entries().iter().filter(|e| e.record.node == "tools").count();
        let agents = clinic.journal.entries().iter().filter(|e| e.record.node == "agent").count();
        assert_eq!(tools, 5);
        assert_eq!(agents, 6);
        assert!(clinic.journal.verify_integrity());
    }
}
