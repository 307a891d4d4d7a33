//! The autobook executor: runs one request through the pipeline or the
//! agent loop.
//!
//! Pipeline:
//!
//!   Input → Retrieve → Route → {Clarify | Schedule → Confirm}
//!
//! Agent loop:
//!
//!   Agent ⇄ ToolExecution, until the oracle stops requesting actions
//!
//! The executor is immutable once built and is shared across runs behind an
//! `Arc`. Each run owns its own `ConversationState`; steps return deltas and
//! the executor is the only place a delta is applied.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use autobook_contracts::{
    error::{AutobookError, AutobookResult},
    event::RunEvent,
    execution::{
        AgentOutcome, AgentRequest, PipelineOutcome, PipelineRequest, RunFailure, RunId,
        RunOutcome, RunRequest, RunStatus, StepRecord,
    },
    limits::RunLimits,
    state::{ConversationState, StateDelta, UserProfile},
};

use crate::{
    agent_loop,
    events::EventSink,
    prompts,
    registry::ActionRegistry,
    router::{next_pipeline_node, PipelineNode, Transition},
    steps::{self, StepContext},
    traits::{NoProfiles, NullJournal, Oracle, ProfileStore, Retriever, StepJournal},
};

/// Runs requests against a fixed set of collaborators.
///
/// # Thread safety
///
/// An `Executor` is never mutated after construction. Share it behind an
/// `Arc` to serve concurrent runs; each run keeps its own state, and the
/// only shared writes go through the journal.
pub struct Executor {
    /// Text-generation backend used by every oracle-backed step.
    oracle: Arc<dyn Oracle>,

    /// Knowledge-base lookup for the pipeline's retrieve step.
    retriever: Arc<dyn Retriever>,

    /// Actions the agent loop may call.
    registry: Arc<ActionRegistry>,

    /// Source of the per-user profile injected into prompts.
    profiles: Arc<dyn ProfileStore>,

    /// Receives one record per applied step, shared by every run.
    journal: Arc<dyn StepJournal>,

    /// Per-call deadlines, retry policy and loop bounds.
    limits: RunLimits,
}

impl Executor {
    /// Create an executor with no profile store and a discarding journal.
    pub fn new(
        oracle: Arc<dyn Oracle>,
        retriever: Arc<dyn Retriever>,
        registry: Arc<ActionRegistry>,
        limits: RunLimits,
    ) -> Self {
        Self {
            oracle,
            retriever,
            registry,
            profiles: Arc::new(NoProfiles),
            journal: Arc::new(NullJournal),
            limits,
        }
    }

    pub fn with_profiles(mut self, profiles: Arc<dyn ProfileStore>) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn with_journal(mut self, journal: Arc<dyn StepJournal>) -> Self {
        self.journal = journal;
        self
    }

    pub fn limits(&self) -> &RunLimits {
        &self.limits
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    // ── Non-streaming entry points ───────────────────────────────────────────

    /// Run the linear pipeline to a terminal step.
    pub async fn run_pipeline(&self, request: PipelineRequest) -> AutobookResult<PipelineOutcome> {
        self.pipeline_with(RunId::new(), request, &EventSink::disabled()).await
    }

    /// Run the agent loop until the oracle replies without action requests.
    pub async fn run_agent(&self, request: AgentRequest) -> AutobookResult<AgentOutcome> {
        self.agent_with(RunId::new(), request, &EventSink::disabled()).await
    }

    /// Run whichever mode the request selects.
    pub async fn run(&self, request: RunRequest) -> AutobookResult<RunOutcome> {
        match request {
            RunRequest::Pipeline(r) => self.run_pipeline(r).await.map(RunOutcome::Pipeline),
            RunRequest::Agent(r) => self.run_agent(r).await.map(RunOutcome::Agent),
        }
    }

    // ── Streaming entry points ───────────────────────────────────────────────

    /// Run the pipeline on a background task, streaming its events.
    ///
    /// The last event is always `End`. Dropping the receiver cancels the run
    /// at its next emission.
    pub fn stream_pipeline(self: &Arc<Self>, request: PipelineRequest) -> mpsc::Receiver<RunEvent> {
        let (events, rx) = EventSink::channel(self.limits.stream_capacity);
        let executor = Arc::clone(self);
        tokio::spawn(async move {
            let result = executor.pipeline_with(RunId::new(), request, &events).await;
            let end = match result {
                Ok(outcome) => end_event(outcome.status, outcome.state.confirmation),
                Err(e) => failure_event(RunFailure::from(&e)),
            };
            let _ = events.emit(end).await;
        });
        rx
    }

    /// Run the agent loop on a background task, streaming its events.
    pub fn stream_agent(self: &Arc<Self>, request: AgentRequest) -> mpsc::Receiver<RunEvent> {
        let (events, rx) = EventSink::channel(self.limits.stream_capacity);
        let executor = Arc::clone(self);
        tokio::spawn(async move {
            let result = executor.agent_with(RunId::new(), request, &events).await;
            let end = match result {
                Ok(outcome) => {
                    let reply = outcome.reply().map(str::to_string);
                    end_event(outcome.status, reply)
                }
                Err(e) => failure_event(RunFailure::from(&e)),
            };
            let _ = events.emit(end).await;
        });
        rx
    }

    pub fn stream(self: &Arc<Self>, request: RunRequest) -> mpsc::Receiver<RunEvent> {
        match request {
            RunRequest::Pipeline(r) => self.stream_pipeline(r),
            RunRequest::Agent(r) => self.stream_agent(r),
        }
    }

    // ── Run drivers ──────────────────────────────────────────────────────────

    /// Drive one pipeline run and finalize its journal, whatever the result.
    ///
    /// A finalize failure replaces the run's own result.
    async fn pipeline_with(
        &self,
        run_id: RunId,
        request: PipelineRequest,
        events: &EventSink,
    ) -> AutobookResult<PipelineOutcome> {
        debug!(run_id = %run_id, mode = "pipeline", "run starting");
        let result = self.drive_pipeline(&run_id, request, events).await;
        self.finish(&run_id, result.as_ref().map(|o| o.status))?;
        result
    }

    /// Drive one agent run and finalize its journal, whatever the result.
    async fn agent_with(
        &self,
        run_id: RunId,
        request: AgentRequest,
        events: &EventSink,
    ) -> AutobookResult<AgentOutcome> {
        debug!(run_id = %run_id, mode = "agent", "run starting");
        let profile = self.load_profile(request.user_id.as_deref());
        let ctx = self.step_context(events);
        let mut journal = RunJournal::new(&run_id, self.journal.as_ref());
        let result = agent_loop::drive(
            &ctx,
            &self.registry,
            &mut journal,
            &run_id,
            prompts::agent(&profile),
            request.messages,
        )
        .await;
        self.finish(&run_id, result.as_ref().map(|o| o.status))?;
        result
    }

    /// Walk the pipeline graph from `Input` until the router reaches a
    /// terminal status. Each step's delta is applied, then journaled.
    async fn drive_pipeline(
        &self,
        run_id: &RunId,
        request: PipelineRequest,
        events: &EventSink,
    ) -> AutobookResult<PipelineOutcome> {
        let profile = self.load_profile(request.user_id.as_deref());
        let mut state = ConversationState::new(request.user_request, request.conversation_history, profile);
        let ctx = self.step_context(events);
        let mut journal = RunJournal::new(run_id, self.journal.as_ref());
        let mut node = PipelineNode::Input;

        loop {
            events.emit(RunEvent::StepStart { step: node.name().to_string() }).await?;

            let delta = match node {
                PipelineNode::Input => steps::input(&state),
                PipelineNode::Retrieve => steps::retrieve(&ctx, &state).await?,
                PipelineNode::Route => steps::route(&ctx, &state).await?,
                PipelineNode::Clarify => steps::clarify(&ctx, &state).await?,
                PipelineNode::Schedule => steps::schedule(&ctx, &state).await?,
                PipelineNode::Confirm => steps::confirm(&ctx, &state).await?,
            };

            let summary = summarize(&delta);
            state.apply(delta)?;
            journal.record(node.name(), summary)?;
            debug!(run_id = %run_id, step = journal.next_step, node = %node, "step applied");

            match next_pipeline_node(node, &state)? {
                Transition::Next(next) => node = next,
                Transition::End(status) => {
                    return Ok(PipelineOutcome { run_id: run_id.clone(), status, state });
                }
            }
        }
    }

    /// The stored profile for `user_id`, or an empty one for anonymous runs.
    fn load_profile(&self, user_id: Option<&str>) -> UserProfile {
        match user_id {
            Some(user_id) => self.profiles.load_profile(user_id),
            None => UserProfile::new(),
        }
    }

    fn step_context<'a>(&'a self, events: &'a EventSink) -> StepContext<'a> {
        StepContext {
            oracle: self.oracle.as_ref(),
            retriever: self.retriever.as_ref(),
            limits: &self.limits,
            events,
        }
    }

    /// Finalize the journal and log how the run ended.
    fn finish(&self, run_id: &RunId, result: Result<RunStatus, &AutobookError>) -> AutobookResult<()> {
        match result {
            Ok(status) => info!(run_id = %run_id, status = ?status, "run finished"),
            Err(e) => warn!(run_id = %run_id, kind = ?e.kind(), error = %e, "run failed"),
        }
        self.journal.finalize(&run_id.to_string())
    }
}

/// Per-run view of the step journal that numbers records.
///
/// Owned by a single run and written from that run's task.
pub(crate) struct RunJournal<'a> {
    /// Id stamped on every record of this run.
    run_id: String,

    /// The executor's shared journal.
    journal: &'a dyn StepJournal,

    /// Index the next record will carry. Starts at 0 and only advances once
    /// a write succeeds, so step numbers have no gaps.
    next_step: u64,
}

impl<'a> RunJournal<'a> {
    pub(crate) fn new(run_id: &RunId, journal: &'a dyn StepJournal) -> Self {
        Self { run_id: run_id.to_string(), journal, next_step: 0 }
    }

    /// Write one step record for `node`.
    pub(crate) fn record(&mut self, node: &str, summary: Value) -> AutobookResult<()> {
        let record = StepRecord {
            run_id: self.run_id.clone(),
            step: self.next_step,
            node: node.to_string(),
            summary,
            timestamp: Utc::now(),
        };
        self.journal.write(&record)?;
        self.next_step += 1;
        Ok(())
    }
}

fn summarize(delta: &StateDelta) -> Value {
    json!({ "fields": delta.touched_fields(), "appended": delta.append.len() })
}

fn end_event(status: RunStatus, confirmation: Option<String>) -> RunEvent {
    RunEvent::End { status, confirmation, failure: None }
}

fn failure_event(failure: RunFailure) -> RunEvent {
    RunEvent::End { status: failure.status(), confirmation: None, failure: Some(failure) }
}

// ── Tests ────────────────────────────────────────────────────────────────────
