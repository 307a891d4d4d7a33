//! Scenario 6: Streaming
//!
//! Replays the pipeline booking as a live event stream and prints the
//! server-sent-event frames a transport would forward to the client.

use std::sync::Arc;

use autobook_contracts::{error::AutobookResult, event::RunEvent};

use crate::deployment::Clinic;

use super::pipeline_booking;

/// Stream the pipeline booking and collect every event until `End`.
pub async fn execute(clinic: &Clinic) -> AutobookResult<Vec<RunEvent>> {
    let executor = clinic.executor(Arc::new(pipeline_booking::oracle()))?;
    let mut events = executor.stream_pipeline(pipeline_booking::request());

    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        let done = event.is_end();
        seen.push(event);
        if done {
            break;
        }
    }
    Ok(seen)
}

pub async fn run_scenario() -> AutobookResult<()> {
    println!("=== Scenario 6: Streaming ===");
    println!();

    let clinic = Clinic::load()?;
    let events = execute(&clinic).await?;

    let steps: Vec<String> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::StepStart { step } => Some(step.clone()),
            _ => None,
        })
        .collect();
    println!("  Steps started:   {}", steps.join(" → "));
    println!("  SSE frames:");
    for frame in events.iter().filter_map(RunEvent::to_sse_frame) {
        println!("    {}", frame.trim_end());
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use autobook_contracts::execution::RunStatus;

    use super::*;

    #[tokio::test]
    async fn confirmation_streams_word_by_word_then_ends() {
        let clinic = Clinic::load().unwrap();
        let events = execute(&clinic).await.unwrap();

        let streamed: String = events
            .iter()
            .filter_map(|e| match e {
                RunEvent::Content { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(streamed, pipeline_booking::CONFIRMATION);

        match events.last() {
            Some(RunEvent::End { status, confirmation, failure }) => {
                assert_eq!(*status, RunStatus::Completed);
                assert_eq!(confirmation.as_deref(), Some(pipeline_booking::CONFIRMATION));
                assert!(failure.is_none());
            }
            other => panic!("expected End, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn step_starts_follow_pipeline_order() {
        let clinic = Clinic::load().unwrap();
        let events = execute(&clinic).await.unwrap();

        let steps: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                RunEvent::StepStart { step } => Some(step.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(steps, vec!["input", "retrieve", "route", "schedule", "confirm"]);
        assert_eq!(events.iter().filter(|e| e.to_sse_frame().is_some()).count(), events.len() - 5);
    }
}
