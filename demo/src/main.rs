//! Autobook Clinic Reference Deployment, Demo CLI
//!
//! Runs one or all of the clinic scenarios against the scripted oracle, or
//! invokes a single built-in action directly.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- pipeline
//!   cargo run -p demo -- clarify
//!   cargo run -p demo -- agent
//!   cargo run -p demo -- stream
//!   cargo run -p demo -- invoke '{"tool_name":"check_calendar_availability","arguments":{"date":"2026-10-20"}}'

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use autobook_actions::BuiltinAction;
use autobook_contracts::{
    action::ToolCallRequest,
    error::{AutobookError, AutobookResult},
};
use autobook_ref_clinic::{
    scenarios::{agent_booking, agent_hours, loop_budget, pipeline_booking, pipeline_clarify, streaming},
    Clinic, ScriptedOracle,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Autobook: conversational appointment scheduling demo.
///
/// Each subcommand runs one or all of the clinic scenarios, showing the
/// linear pipeline, the tool-calling agent loop, and live streaming.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Autobook clinic reference deployment demo",
    long_about = "Runs autobook clinic scenarios showing routing, clarification,\n\
                  tool calling, loop bounds, streaming and the step journal."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every scenario in sequence.
    RunAll,
    /// Scenario 1: a detailed request routed straight to scheduling.
    Pipeline,
    /// Scenario 2: a vague request clarified, then scheduled next turn.
    Clarify,
    /// Scenarios 3-5: the agent loop answering, booking, and hitting its bound.
    Agent,
    /// Scenario 6: the pipeline booking as server-sent-event frames.
    Stream,
    /// Dispatch one tool call JSON through the clinic's action registry.
    Invoke {
        /// e.g. {"tool_name":"search_knowledge_base","arguments":{"query":"parking"}}
        json: String,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Demo error: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        match cli.command {
            Command::RunAll => run_all().await,
            Command::Pipeline => pipeline_booking::run_scenario().await,
            Command::Clarify => pipeline_clarify::run_scenario().await,
            Command::Agent => run_agent().await,
            Command::Stream => streaming::run_scenario().await,
            Command::Invoke { json } => invoke(&json).await,
        }
    });

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

async fn run_all() -> AutobookResult<()> {
    pipeline_booking::run_scenario().await?;
    pipeline_clarify::run_scenario().await?;
    run_agent().await?;
    streaming::run_scenario().await?;
    Ok(())
}

async fn run_agent() -> AutobookResult<()> {
    agent_hours::run_scenario().await?;
    agent_booking::run_scenario().await?;
    loop_budget::run_scenario().await?;
    Ok(())
}

async fn invoke(json: &str) -> AutobookResult<()> {
    let call: ToolCallRequest = serde_json::from_str(json).map_err(|e| AutobookError::InvalidArguments {
        action: "invoke".to_string(),
        reason: format!("not a tool call: {}", e),
    })?;
    let Some(action) = BuiltinAction::from_name(&call.tool_name) else {
        return Err(AutobookError::UnknownAction { name: call.tool_name });
    };

    let clinic = Clinic::load()?;
    let executor = clinic.executor(Arc::new(ScriptedOracle::new()))?;
    info!(action = %action, "invoking built-in action");
    let output = executor.registry().dispatch(&call).await?;

    println!("=== Invoke: {} ===", action);
    println!();
    println!("  Arguments:       {}", serde_json::Value::Object(call.arguments));
    println!("  Output:          {}", output);
    println!();
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Autobook: Conversational Scheduling Assistant");
    println!("Clinic Reference Demo");
    println!("=============================================");
    println!();
    println!("Pipeline mode per request:");
    println!("  [1] Input     append the user's message to the history");
    println!("  [2] Retrieve  search the clinic knowledge base");
    println!("  [3] Route     oracle decides SCHEDULE or CLARIFY");
    println!("  [4] Clarify   ask a follow-up question, or");
    println!("      Schedule  propose an appointment → Confirm");
    println!();
    println!("Agent mode: Agent ⇄ Tools until the oracle answers without tool calls,");
    println!("bounded by max_round_trips. Every step is written to a SHA-256 journal.");
    println!();
}
