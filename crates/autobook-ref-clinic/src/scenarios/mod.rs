//! Clinic demo scenarios.
//!
//! Each scenario wires the real runtime (executor, registry, built-in
//! actions, journal) to the bundled knowledge base and a scripted oracle.

pub mod agent_booking;
pub mod agent_hours;
pub mod loop_budget;
pub mod pipeline_booking;
pub mod pipeline_clarify;
pub mod streaming;

use autobook_contracts::message::Message;

use crate::deployment::Clinic;

fn print_history(history: &[Message]) {
    for message in history {
        match (&message.tool_name, &message.call_id) {
            (Some(tool), Some(call_id)) => {
                println!("    [{}] {} ({}): {}", message.role, tool, call_id, one_line(&message.content));
            }
            _ => println!("    [{}] {}", message.role, one_line(&message.content)),
        }
    }
}

fn print_journal(clinic: &Clinic, run_id: &str) {
    let log = clinic.journal.export_run(run_id);
    let nodes: Vec<&str> = log.entries.iter().map(|e| e.record.node.as_str()).collect();
    println!("  Journal steps:   {}", nodes.join(" → "));
    println!(
        "  Journal chain:   {} (finalized: {})",
        if clinic.journal.verify_integrity() { "VERIFIED" } else { "FAILED" },
        log.finalized
    );
}

fn one_line(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 100 {
        format!("{}…", flat.chars().take(100).collect::<String>())
    } else {
        flat
    }
}
