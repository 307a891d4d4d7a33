//! Journal entry and export types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use autobook_contracts::execution::StepRecord;

/// One link in the journal's hash chain.
///
/// The chain spans every run the journal has seen; `record.run_id` tells
/// runs apart. Changing any field, including inside `record`, breaks
/// `this_hash` and every later `prev_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the chain, starting at 0.
    pub sequence: u64,
    pub record: StepRecord,
    /// `this_hash` of the previous entry, or `GENESIS_HASH` for the first.
    pub prev_hash: String,
    /// SHA-256 (hex) over sequence, prev_hash and the record's JSON.
    pub this_hash: String,
}

impl JournalEntry {
    /// The `prev_hash` of the first entry in every journal.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// The entries of a single run, exported from the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub run_id: String,
    /// The run's entries in chain order. Sequences are global, so they may
    /// have gaps where other runs interleaved.
    pub entries: Vec<JournalEntry>,
    /// Whether the executor finalized this run.
    pub finalized: bool,
    pub exported_at: DateTime<Utc>,
    /// `this_hash` of the run's last entry; empty when it has none.
    pub terminal_hash: String,
}
