//! Scenario 2: Clarification Across Turns
//!
//! The first request is too vague, so the pipeline stops at Clarify and
//! asks a question. The session carries that exchange into the second run,
//! which has enough detail to schedule.

use std::sync::Arc;

use autobook_contracts::{error::AutobookResult, execution::PipelineOutcome};
use autobook_core::{oracle::Purpose, Session};

use crate::{deployment::Clinic, oracle::ScriptedOracle};

pub const FIRST_TURN: &str = "I need an appointment.";
pub const QUESTION: &str = "Happy to help! Which doctor would you like to see, and on which day?";
pub const SECOND_TURN: &str = "Dr. Smith on Tuesday afternoon, please.";
pub const PROPOSAL: &str = "Book Alex Morgan with Dr. Smith at 2:00 PM on Tuesday.";
pub const CONFIRMATION: &str = "Done! You're booked with Dr. Smith on Tuesday at 2:00 PM.";

pub fn oracle() -> ScriptedOracle {
    ScriptedOracle::new()
        .reply(Purpose::Route, "CLARIFY")
        .reply(Purpose::Route, "SCHEDULE")
        .reply(Purpose::Clarify, QUESTION)
        .reply(Purpose::Schedule, PROPOSAL)
        .reply(Purpose::Confirm, CONFIRMATION)
}

/// Run both turns and return the session with each turn's outcome.
pub async fn execute(clinic: &Clinic) -> AutobookResult<(Session, PipelineOutcome, PipelineOutcome)> {
    let executor = clinic.executor(Arc::new(oracle()))?;
    let mut session = Session::new(executor, Some("default_user".to_string()));
    let first = session.send(FIRST_TURN).await?;
    let second = session.send(SECOND_TURN).await?;
    Ok((session, first, second))
}

pub async fn run_scenario() -> AutobookResult<()> {
    println!("=== Scenario 2: Clarification Across Turns ===");
    println!();

    let clinic = Clinic::load()?;
    let (session, first, second) = execute(&clinic).await?;

    println!("  Turn 1:          {}", FIRST_TURN);
    println!("  Route:           {}", first.state.next_action.map(|a| a.to_string()).unwrap_or_default());
    println!("  Status:          {:?}", first.status);
    println!("  Assistant:       {}", first.state.confirmation.as_deref().unwrap_or("-"));
    println!();
    println!("  Turn 2:          {}", SECOND_TURN);
    println!("  Route:           {}", second.state.next_action.map(|a| a.to_string()).unwrap_or_default());
    println!("  Status:          {:?}", second.status);
    println!("  Assistant:       {}", second.state.confirmation.as_deref().unwrap_or("-"));
    println!();
    println!("  Session history:");
    super::print_history(session.history());
    println!("  Runs finalized:  {}", clinic.journal.finalized_runs().len());
    println!();
    Ok(())
}
