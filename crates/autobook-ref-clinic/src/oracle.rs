//! A scripted oracle for deterministic demos and tests.
//!
//! Step prompts are answered from a per-purpose script; each purpose's
//! replies are used in order and the last one repeats. Agent steps pop a
//! queue of replies and fall back to a repeating reply when it runs dry.
//! Text is streamed word by word through the token sink.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use autobook_contracts::error::{AutobookError, AutobookResult};
use autobook_core::{
    oracle::{OracleReply, OracleRequest, Purpose, TokenSink},
    traits::Oracle,
};

#[derive(Default)]
struct Script {
    replies: HashMap<Purpose, VecDeque<String>>,
    agent_turns: VecDeque<OracleReply>,
    seen: Vec<Purpose>,
}

#[derive(Default)]
pub struct ScriptedOracle {
    script: Mutex<Script>,
    agent_fallback: Option<OracleReply>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `purpose`.
    pub fn reply(self, purpose: Purpose, text: impl Into<String>) -> Self {
        self.lock().replies.entry(purpose).or_default().push_back(text.into());
        self
    }

    /// Queue the reply for the next agent step.
    pub fn agent_turn(self, reply: OracleReply) -> Self {
        self.lock().agent_turns.push_back(reply);
        self
    }

    /// Answer every agent step past the queue with `reply`.
    pub fn repeat_agent(mut self, reply: OracleReply) -> Self {
        self.agent_fallback = Some(reply);
        self
    }

    /// Purposes of every prompt answered so far, in order.
    pub fn prompts_seen(&self) -> Vec<Purpose> {
        self.lock().seen.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn next_reply(&self, purpose: Purpose) -> AutobookResult<OracleReply> {
        let mut script = self.lock();
        script.seen.push(purpose);

        let reply = match purpose {
            Purpose::Agent => script.agent_turns.pop_front().or_else(|| self.agent_fallback.clone()),
            other => {
                let queue = script.replies.entry(other).or_default();
                let text = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
                text.map(OracleReply::text)
            }
        };

        reply.ok_or_else(|| AutobookError::OracleUnavailable {
            reason: format!("no scripted reply for {purpose:?}"),
        })
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn respond(&self, request: &OracleRequest, tokens: &TokenSink) -> AutobookResult<OracleReply> {
        let reply = self.next_reply(request.purpose)?;
        for word in reply.content.split_inclusive(' ') {
            tokens.token(word).await?;
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use autobook_contracts::{action::ToolCallRequest, error::ErrorKind};
    use autobook_core::{
        oracle::{OracleReply, OracleRequest, Purpose, TokenSink},
        traits::Oracle,
    };

    use super::ScriptedOracle;

    fn request(purpose: Purpose) -> OracleRequest {
        OracleRequest::new(purpose, "instruction", vec![])
    }

    #[tokio::test]
    async fn last_reply_per_purpose_repeats() {
        let oracle = ScriptedOracle::new()
            .reply(Purpose::Route, "CLARIFY")
            .reply(Purpose::Route, "SCHEDULE");
        let muted = TokenSink::muted();

        let mut decisions = Vec::new();
        for _ in 0..3 {
            decisions.push(oracle.respond(&request(Purpose::Route), &muted).await.unwrap().content);
        }
        assert_eq!(decisions, vec!["CLARIFY", "SCHEDULE", "SCHEDULE"]);
    }

    #[tokio::test]
    async fn agent_queue_then_fallback() {
        let call = ToolCallRequest::new("check_calendar_availability", json!({ "date": "2026-10-20" }), "c");
        let oracle = ScriptedOracle::new()
            .agent_turn(OracleReply::text("first"))
            .repeat_agent(OracleReply::calls(vec![call]));
        let muted = TokenSink::muted();

        let first = oracle.respond(&request(Purpose::Agent), &muted).await.unwrap();
        let second = oracle.respond(&request(Purpose::Agent), &muted).await.unwrap();
        assert_eq!(first.content, "first");
        assert!(second.has_tool_calls());
        assert_eq!(oracle.prompts_seen(), vec![Purpose::Agent, Purpose::Agent]);
    }

    #[tokio::test]
    async fn unscripted_purpose_is_unavailable() {
        let oracle = ScriptedOracle::new();
        let err = oracle.respond(&request(Purpose::Confirm), &TokenSink::muted()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OracleUnavailable);
    }
}
