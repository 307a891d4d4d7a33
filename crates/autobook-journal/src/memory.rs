//! In-memory `StepJournal`.
//!
//! One journal is shared by every run of an executor, so all state sits
//! behind a single `Mutex`. Records from concurrent runs interleave in the
//! chain; `export_run` pulls one run back out.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info};

use autobook_contracts::{
    error::{AutobookError, AutobookResult},
    execution::StepRecord,
};
use autobook_core::traits::StepJournal;

use crate::{
    chain::{hash_entry, verify_chain},
    entry::{JournalEntry, RunLog},
};

// ── Internal mutable state ────────────────────────────────────────────────────

/// The mutable interior of an `InMemoryJournal`.
///
/// Every clone of the journal shares one `JournalState`, so the executor
/// can write through its `Arc<dyn StepJournal>` while a caller holding a
/// clone exports or verifies.
pub(crate) struct JournalState {
    /// Every entry written so far, across all runs, in append order. An
    /// entry's index is its `sequence`.
    pub(crate) entries: Vec<JournalEntry>,

    /// The `this_hash` of the last entry, or `GENESIS_HASH` before any entry
    /// has been written.
    pub(crate) last_hash: String,

    /// Ids of runs that have ended. Further writes for them are rejected.
    pub(crate) finalized: BTreeSet<String>,
}

// ── Public journal ────────────────────────────────────────────────────────────

/// An append-only journal backed by a SHA-256 hash chain.
///
/// # Thread safety
///
/// Every method takes the internal `Mutex` for the duration of the call and
/// never holds it across an `.await`. Cloning is cheap and every clone
/// observes the same chain.
///
/// # Panics
///
/// Never panics on a poisoned lock: the state is recovered and used as is.
/// A writer that panicked mid-append leaves at most a missing entry.
#[derive(Clone)]
pub struct InMemoryJournal {
    pub(crate) state: Arc<Mutex<JournalState>>,
}

impl Default for InMemoryJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryJournal {
    /// Create an empty journal.
    ///
    /// `last_hash` starts at `JournalEntry::GENESIS_HASH`, so the first
    /// entry's `prev_hash` is correct without special-casing.
    pub fn new() -> Self {
        let state = JournalState {
            entries: Vec::new(),
            last_hash: JournalEntry::GENESIS_HASH.to_string(),
            finalized: BTreeSet::new(),
        };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    fn lock(&self) -> MutexGuard<'_, JournalState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Entries across all runs, in chain order.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Ids of runs that have been finalized, sorted.
    pub fn finalized_runs(&self) -> Vec<String> {
        self.lock().finalized.iter().cloned().collect()
    }

    /// Export the entries of one run.
    pub fn export_run(&self, run_id: &str) -> RunLog {
        let state = self.lock();
        let entries: Vec<JournalEntry> = state
            .entries
            .iter()
            .filter(|e| e.record.run_id == run_id)
            .cloned()
            .collect();
        let terminal_hash = entries.last().map(|e| e.this_hash.clone()).unwrap_or_default();

        RunLog {
            run_id: run_id.to_string(),
            entries,
            finalized: state.finalized.contains(run_id),
            exported_at: Utc::now(),
            terminal_hash,
        }
    }

    /// Recheck every hash link in the chain.
    ///
    /// Returns false if any entry was changed, removed or reordered since it
    /// was written.
    pub fn verify_integrity(&self) -> bool {
        verify_chain(&self.lock().entries)
    }
}

impl StepJournal for InMemoryJournal {
    /// Append one record. Writing to a finalized run is a `StateViolation`.
    fn write(&self, record: &StepRecord) -> AutobookResult<()> {
        let mut state = self.lock();
        if state.finalized.contains(&record.run_id) {
            return Err(AutobookError::StateViolation {
                reason: format!("run '{}' is already finalized", record.run_id),
            });
        }

        let sequence = state.entries.len() as u64;
        let prev_hash = state.last_hash.clone();
        let this_hash = hash_entry(sequence, record, &prev_hash)?;

        state.entries.push(JournalEntry {
            sequence,
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.last_hash = this_hash;

        debug!(run_id = %record.run_id, sequence, node = %record.node, "journal entry appended");
        Ok(())
    }

    /// Mark `run_id` as ended. Idempotent. A run that failed before its
    /// first step has no entries and is finalized all the same.
    fn finalize(&self, run_id: &str) -> AutobookResult<()> {
        let mut state = self.lock();
        let steps = state.entries.iter().filter(|e| e.record.run_id == run_id).count();
        state.finalized.insert(run_id.to_string());

        info!(
            run_id = %run_id,
            steps,
            chain_head = %state.last_hash,
            "run journal finalized"
        );
        Ok(())
    }
}
