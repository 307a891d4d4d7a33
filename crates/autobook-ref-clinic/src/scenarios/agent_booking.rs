//! Scenario 4: Agent Books an Appointment
//!
//! The oracle checks availability and searches the knowledge base in the
//! same turn (both run concurrently), books the 2:00 PM slot, then confirms.
//! Participants arrive as a single string and are coerced to a list.

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

pub const REQUEST: &str = "Can you book me in with Dr. Smith on 2026-10-20?";
pub const BOOKING_DATE: &str = "2026-10-20";
pub const REPLY: &str = "You're booked with Dr. Smith on 2026-10-20 at 2:00 PM. An invite is on its way.";

pub fn oracle() -> ScriptedOracle {
    let check = ToolCallRequest::new("check_calendar_availability", json!({ "date": BOOKING_DATE }), "call_check");
    let search = ToolCallRequest::new("search_knowledge_base", json!({ "query": "Dr. Smith availability" }), "call_search");
    let invite = ToolCallRequest::new(
        "create_calendar_invite",
        json!({
            "date": BOOKING_DATE,
            "time": "2:00 PM",
            "title": "Checkup with Dr. Smith",
            "participants": "alex.morgan@example.com",
        }),
        "call_invite",
    );
    ScriptedOracle::new()
        .agent_turn(OracleReply::calls(vec![check, search]))
        .agent_turn(OracleReply::calls(vec![invite]))
        .agent_turn(OracleReply::text(REPLY))
}

pub async fn execute(clinic: &Clinic) -> AutobookResult<AgentOutcome> {
    let executor = clinic.executor(Arc::new(oracle()))?;
    let mut request = AgentRequest::new(vec![Message::human(REQUEST)]);
    request.user_id = Some("default_user".to_string());
    executor.run_agent(request).await
}

pub async fn run_scenario() -> AutobookResult<()> {
    println!("=== Scenario 4: Agent Books an Appointment ===");
    println!();

    let clinic = Clinic::load()?;
    let outcome = execute(&clinic).await?;

    println!("  Request:         {}", REQUEST);
    println!("  Agent steps:     {}", outcome.agent_steps);
    println!("  Round trips:     {}", outcome.tool_round_trips);
    println!("  History:");
    super::print_history(&outcome.history);
    for invite in clinic.calendar.invites() {
        println!(
            "  Calendar:        '{}' on {} at {} with {}",
            invite.title,
            invite.date,
            invite.time,
            invite.participants.join(", ")
        );
    }
    println!("  Reply:           {}", outcome.reply().unwrap_or("-"));
    super::print_journal(&clinic, &outcome.run_id.to_string());
    println!();
    Ok(())
}
