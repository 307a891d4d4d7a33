//! Hand-written collaborators shared by this crate's unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use autobook_contracts::{
    action::{ActionArguments, ActionSpec, ArgType, ArgumentSpec},
    error::{AutobookError, AutobookResult},
    execution::StepRecord,
    state::UserProfile,
};

use crate::{
    oracle::{OracleReply, OracleRequest, Purpose, TokenSink},
    registry::ActionRegistry,
    traits::{ActionHandler, Oracle, ProfileStore, Retriever, StepJournal},
};

/// Fixed replies per purpose, plus a queue for agent steps.
#[derive(Default)]
pub struct MockOracle {
    pub replies: HashMap<Purpose, String>,
    pub agent_replies: Mutex<VecDeque<OracleReply>>,
    /// Returned once the agent queue is empty.
    pub agent_fallback: Option<OracleReply>,
    pub delay: Option<Duration>,
    pub requests: Arc<Mutex<Vec<OracleRequest>>>,
}

impl MockOracle {
    pub fn with_reply(mut self, purpose: Purpose, text: &str) -> Self {
        self.replies.insert(purpose, text.to_string());
        self
    }

    pub fn with_agent_replies(self, replies: Vec<OracleReply>) -> Self {
        *self.agent_replies.lock().unwrap() = replies.into();
        self
    }

    pub fn calls_for(&self, purpose: Purpose) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| r.purpose == purpose).count()
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn respond(&self, request: &OracleRequest, tokens: &TokenSink) -> AutobookResult<OracleReply> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = match request.purpose {
            Purpose::Agent => {
                let queued = self.agent_replies.lock().unwrap().pop_front();
                queued.or_else(|| self.agent_fallback.clone()).unwrap_or_default()
            }
            purpose => OracleReply::text(self.replies.get(&purpose).cloned().unwrap_or_default()),
        };
        tokens.token(&reply.content).await?;
        Ok(reply)
    }
}

/// Returns the same findings for every query and records the queries.
pub struct StubRetriever {
    pub answer: String,
    pub queries: Arc<Mutex<Vec<String>>>,
}

impl StubRetriever {
    pub fn new(answer: &str) -> Self {
        Self { answer: answer.to_string(), queries: Arc::new(Mutex::new(vec![])) }
    }
}

#[async_trait]
impl Retriever for StubRetriever {
    async fn search(&self, query: &str) -> AutobookResult<String> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.answer.clone())
    }
}

/// Answers after an optional delay and counts invocations.
pub struct CannedHandler {
    pub output: String,
    pub delay: Option<Duration>,
    pub invocations: Arc<Mutex<u32>>,
}

impl CannedHandler {
    pub fn new(output: &str) -> Self {
        Self { output: output.to_string(), delay: None, invocations: Arc::new(Mutex::new(0)) }
    }
}

#[async_trait]
impl ActionHandler for CannedHandler {
    async fn invoke(&self, _arguments: &ActionArguments) -> AutobookResult<String> {
        *self.invocations.lock().unwrap() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.output.clone())
    }
}

/// Always reports a domain failure.
pub struct FailingHandler;

#[async_trait]
impl ActionHandler for FailingHandler {
    async fn invoke(&self, _arguments: &ActionArguments) -> AutobookResult<String> {
        Err(AutobookError::HandlerFailure {
            action: "create_calendar_invite".to_string(),
            reason: "calendar is read-only".to_string(),
        })
    }
}

/// Forwards the `query` argument to a retriever.
pub struct SearchHandler(pub Arc<StubRetriever>);

#[async_trait]
impl ActionHandler for SearchHandler {
    async fn invoke(&self, arguments: &ActionArguments) -> AutobookResult<String> {
        let query = arguments.get("query").and_then(|v| v.as_str()).unwrap_or_default();
        self.0.search(query).await
    }
}

pub fn search_spec() -> ActionSpec {
    ActionSpec {
        name: "search_knowledge_base".to_string(),
        description: "Search the clinic knowledge base".to_string(),
        arguments: vec![ArgumentSpec::required("query", ArgType::String, "what to look up")],
    }
}

pub fn simple_spec(name: &str) -> ActionSpec {
    ActionSpec {
        name: name.to_string(),
        description: format!("test action {name}"),
        arguments: vec![ArgumentSpec::required("date", ArgType::String, "YYYY-MM-DD")],
    }
}

pub fn registry_with(entries: Vec<(ActionSpec, Arc<dyn ActionHandler>)>) -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    for (spec, handler) in entries {
        registry.register(spec, handler).unwrap();
    }
    registry
}

/// Records every write and finalize call.
#[derive(Default)]
pub struct MockJournal {
    pub records: Arc<Mutex<Vec<StepRecord>>>,
    pub finalized: Arc<Mutex<Vec<String>>>,
}

impl StepJournal for MockJournal {
    fn write(&self, record: &StepRecord) -> AutobookResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn finalize(&self, run_id: &str) -> AutobookResult<()> {
        self.finalized.lock().unwrap().push(run_id.to_string());
        Ok(())
    }
}

/// One profile, keyed by user id.
pub struct OneProfile {
    pub user_id: String,
    pub profile: UserProfile,
}

impl ProfileStore for OneProfile {
    fn load_profile(&self, user_id: &str) -> UserProfile {
        if user_id == self.user_id {
            self.profile.clone()
        } else {
            UserProfile::new()
        }
    }
}
