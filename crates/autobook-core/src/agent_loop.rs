//! The tool-calling agent loop: `Agent ⇄ ToolExecution`.

use std::collections::HashSet;

use futures::future::join_all;
use serde_json::json;
use tracing::{debug, warn};

use autobook_contracts::{
    action::ToolCallRequest,
    error::{AutobookError, AutobookResult},
    event::RunEvent,
    execution::{AgentOutcome, RunId, RunStatus},
    message::Message,
};

use crate::{
    executor::RunJournal,
    oracle::{OracleRequest, Purpose},
    registry::ActionRegistry,
    router::{after_agent_step, AgentTransition},
    steps::StepContext,
};

/// Drive the loop until the oracle stops requesting actions.
pub(crate) async fn drive(
    ctx: &StepContext<'_>,
    registry: &ActionRegistry,
    journal: &mut RunJournal<'_>,
    run_id: &RunId,
    instruction: String,
    messages: Vec<Message>,
) -> AutobookResult<AgentOutcome> {
    let specs = registry.specs();
    let mut history = messages;
    let mut agent_steps = 0u32;
    let mut round_trips = 0u32;

    loop {
        // ── Agent step ───────────────────────────────────────────────────────
        ctx.events.emit(RunEvent::StepStart { step: "agent".to_string() }).await?;
        let request = OracleRequest::new(Purpose::Agent, instruction.clone(), history.clone())
            .with_actions(specs.clone());
        let reply = ctx.ask(request, true).await?;
        agent_steps += 1;

        let calls = normalize_call_ids(reply.tool_calls);
        let mut appended = Vec::new();
        if calls.is_empty() || !reply.content.trim().is_empty() {
            appended.push(Message::assistant(reply.content));
        }
        journal.record(
            "agent",
            json!({ "tool_calls": calls.len(), "appended": appended.len() }),
        )?;
        history.extend(appended);

        debug!(
            run_id = %run_id,
            step = agent_steps,
            calls = calls.len(),
            "agent step applied"
        );

        match after_agent_step(calls.len(), round_trips, ctx.limits)? {
            AgentTransition::Finish => {
                return Ok(AgentOutcome {
                    run_id: run_id.clone(),
                    status: RunStatus::Completed,
                    history,
                    agent_steps,
                    tool_round_trips: round_trips,
                });
            }
            AgentTransition::ExecuteTools => {}
        }

        // ── Tool execution step ──────────────────────────────────────────────
        for call in &calls {
            ctx.events.emit(RunEvent::ToolCall { call: call.clone() }).await?;
        }
        ctx.events.emit(RunEvent::StepStart { step: "tools".to_string() }).await?;

        let results = execute_tools(ctx, registry, &calls).await?;
        ensure_answered(&calls, &results)?;
        journal.record(
            "tools",
            json!({
                "call_ids": calls.iter().map(|c| c.call_id.as_str()).collect::<Vec<_>>(),
                "appended": results.len(),
            }),
        )?;
        history.extend(results);
        round_trips += 1;
    }
}

/// Give every call a unique, non-empty id within its turn.
pub(crate) fn normalize_call_ids(calls: Vec<ToolCallRequest>) -> Vec<ToolCallRequest> {
    let mut seen = HashSet::new();
    calls
        .into_iter()
        .map(|mut call| {
            if call.call_id.is_empty() {
                call.call_id = fresh_call_id();
            } else if seen.contains(&call.call_id) {
                let rekeyed = fresh_call_id();
                warn!(
                    call_id = %call.call_id,
                    new_call_id = %rekeyed,
                    tool = %call.tool_name,
                    "duplicate call id re-keyed"
                );
                call.call_id = rekeyed;
            }
            seen.insert(call.call_id.clone());
            call
        })
        .collect()
}

fn fresh_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}

/// Check that every call has exactly one tool result carrying its id.
pub(crate) fn ensure_answered(calls: &[ToolCallRequest], results: &[Message]) -> AutobookResult<()> {
    for call in calls {
        let answers = results.iter().filter(|m| m.answers(&call.call_id)).count();
        if answers != 1 {
            return Err(AutobookError::UnansweredToolCall { call_id: call.call_id.clone() });
        }
    }
    Ok(())
}

/// Run one turn's calls and return their results in issue order.
async fn execute_tools(
    ctx: &StepContext<'_>,
    registry: &ActionRegistry,
    calls: &[ToolCallRequest],
) -> AutobookResult<Vec<Message>> {
    let mut results = Vec::with_capacity(calls.len());

    if ctx.limits.parallel_tools {
        for call in calls {
            ctx.events.emit(tool_start(call)).await?;
        }
        let outputs = join_all(calls.iter().map(|call| execute_one(ctx, registry, call))).await;
        for (call, output) in calls.iter().zip(outputs) {
            let output = output?;
            ctx.events.emit(tool_end(call, &output)).await?;
            results.push(Message::tool_result(&call.call_id, &call.tool_name, output));
        }
    } else {
        for call in calls {
            ctx.events.emit(tool_start(call)).await?;
            let output = execute_one(ctx, registry, call).await?;
            ctx.events.emit(tool_end(call, &output)).await?;
            results.push(Message::tool_result(&call.call_id, &call.tool_name, output));
        }
    }

    Ok(results)
}

/// Dispatch one call under the tool deadline.
///
/// Tool-local failures become `"Error: ..."` text for the oracle. Anything
/// else, including a timeout, ends the run.
async fn execute_one(
    ctx: &StepContext<'_>,
    registry: &ActionRegistry,
    call: &ToolCallRequest,
) -> AutobookResult<String> {
    let deadline = ctx.limits.tool_timeout();
    let result = match tokio::time::timeout(deadline, registry.dispatch(call)).await {
        Ok(result) => result,
        Err(_) => Err(AutobookError::Timeout {
            operation: format!("tool '{}'", call.tool_name),
            after_ms: deadline.as_millis() as u64,
        }),
    };

    match result {
        Ok(output) => Ok(output),
        Err(e) if e.is_tool_local() => {
            warn!(call_id = %call.call_id, tool = %call.tool_name, error = %e, "tool call failed");
            Ok(format!("Error: {e}"))
        }
        Err(e) => Err(e),
    }
}

fn tool_start(call: &ToolCallRequest) -> RunEvent {
    RunEvent::ToolStart {
        call_id: call.call_id.clone(),
        tool_name: call.tool_name.clone(),
        arguments: call.arguments.clone(),
    }
}

fn tool_end(call: &ToolCallRequest, output: &str) -> RunEvent {
    RunEvent::ToolEnd {
        call_id: call.call_id.clone(),
        tool_name: call.tool_name.clone(),
        output: output.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use autobook_contracts::{action::ToolCallRequest, error::AutobookError, message::Message};

    use super::{ensure_answered, normalize_call_ids};

    #[test]
    fn empty_and_duplicate_ids_are_rekeyed() {
        let calls = normalize_call_ids(vec![
            ToolCallRequest::new("a", json!({}), ""),
            ToolCallRequest::new("b", json!({}), "x"),
            ToolCallRequest::new("c", json!({}), "x"),
        ]);

        assert!(calls[0].call_id.starts_with("call_"));
        assert_eq!(calls[1].call_id, "x");
        assert_ne!(calls[2].call_id, "x");
        assert_ne!(calls[0].call_id, calls[2].call_id);
    }

    #[test]
    fn every_call_needs_exactly_one_answer() {
        let calls = vec![
            ToolCallRequest::new("a", json!({}), "1"),
            ToolCallRequest::new("b", json!({}), "2"),
        ];
        let answered = vec![Message::tool_result("1", "a", "ok"), Message::tool_result("2", "b", "ok")];
        assert!(ensure_answered(&calls, &answered).is_ok());

        let missing = vec![Message::tool_result("1", "a", "ok")];
        assert_eq!(
            ensure_answered(&calls, &missing).unwrap_err(),
            AutobookError::UnansweredToolCall { call_id: "2".to_string() }
        );

        let doubled = vec![
            Message::tool_result("1", "a", "ok"),
            Message::tool_result("1", "a", "again"),
            Message::tool_result("2", "b", "ok"),
        ];
        assert!(ensure_answered(&calls, &doubled).is_err());
    }
}
