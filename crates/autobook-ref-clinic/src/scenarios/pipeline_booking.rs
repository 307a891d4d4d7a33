//! Scenario 1: Pipeline Booking
//!
//! A request with enough detail goes Input → Retrieve → Route(SCHEDULE) →
//! Schedule → Confirm. The scheduling prompt carries the user's profile.

use std::sync::Arc;

use autobook_contracts::{
    error::AutobookResult,
    execution::{PipelineOutcome, PipelineRequest},
};
use autobook_core::oracle::Purpose;

use crate::{deployment::Clinic, oracle::ScriptedOracle};

pub const REQUEST: &str = "I'd like to book a checkup with Dr. Smith on Tuesday afternoon.";
pub const PROPOSAL: &str = "Book a routine checkup for Alex Morgan with Dr. Smith at 2:00 PM on Tuesday.";
pub const CONFIRMATION: &str =
    "You're all set, Alex! Your checkup with Dr. Smith is booked for Tuesday at 2:00 PM.";

pub fn oracle() -> ScriptedOracle {
    ScriptedOracle::new()
        .reply(Purpose::Route, "SCHEDULE")
        .reply(Purpose::Schedule, PROPOSAL)
        .reply(Purpose::Confirm, CONFIRMATION)
}

pub fn request() -> PipelineRequest {
    let mut request = PipelineRequest::new(REQUEST);
    request.user_id = Some("default_user".to_string());
    request
}

pub async fn execute(clinic: &Clinic) -> AutobookResult<PipelineOutcome> {
    let executor = clinic.executor(Arc::new(oracle()))?;
    executor.run_pipeline(request()).await
}

pub async fn run_scenario() -> AutobookResult<()> {
    println!("=== Scenario 1: Pipeline Booking ===");
    println!();

    let clinic = Clinic::load()?;
    let outcome = execute(&clinic).await?;
    let state = &outcome.state;

    println!("  User request:    {}", state.user_request);
    println!(
        "  Profile:         {} (prefers {})",
        state.user_profile.get("name").map(String::as_str).unwrap_or("-"),
        state.user_profile.get("preferred_doctor").map(String::as_str).unwrap_or("-")
    );
    println!("  Findings:        {} character(s) retrieved", state.research_findings.as_deref().unwrap_or("").len());
    println!("  Route:           {}", state.next_action.map(|a| a.to_string()).unwrap_or_default());
    println!("  Schedule:        {}", state.schedule.as_deref().unwrap_or("-"));
    println!("  Confirmation:    {}", state.confirmation.as_deref().unwrap_or("-"));
    println!("  Status:          {:?}", outcome.status);
    super::print_journal(&clinic, &outcome.run_id.to_string());
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use autobook_contracts::{
        execution::RunStatus,
        message::{Message, Role},
        state::NextAction,
    };

    use super::*;

    #[tokio::test]
    async fn booking_runs_every_pipeline_step() {
        let clinic = Clinic::load().unwrap();
        let outcome = execute(&clinic).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.state.next_action, Some(NextAction::Schedule));
        assert_eq!(outcome.state.schedule.as_deref(), Some(PROPOSAL));
        assert_eq!(outcome.state.confirmation.as_deref(), Some(CONFIRMATION));
        assert!(outcome.state.research_findings.as_deref().unwrap().contains("Dr. Smith"));
        assert_eq!(
            outcome.state.conversation_history,
            vec![Message::human(REQUEST), Message::assistant(CONFIRMATION)]
        );
        assert_eq!(outcome.state.conversation_history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn profile_is_loaded_and_run_is_journaled() {
        let clinic = Clinic::load().unwrap();
        let outcome = execute(&clinic).await.unwrap();

        assert_eq!(outcome.state.user_profile.get("name").map(String::as_str), Some("Alex Morgan"));

        let log = clinic.journal.export_run(&outcome.run_id.to_string());
        let nodes: Vec<&str> = log.entries.iter().map(|e| e.record.node.as_str()).collect();
        assert_eq!(nodes, vec!["input", "retrieve", "route", "schedule", "confirm"]);
        assert!(log.finalized);
        assert!(clinic.journal.verify_integrity());
    }
}
