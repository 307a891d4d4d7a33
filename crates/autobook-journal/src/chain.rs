//! Hash-chain primitives.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   3. compact JSON of the step record

use sha2::{Digest, Sha256};

use autobook_contracts::{
    error::{AutobookError, AutobookResult},
    execution::StepRecord,
};

use crate::entry::JournalEntry;

/// Compute the lowercase hex SHA-256 for one entry.
pub fn hash_entry(sequence: u64, record: &StepRecord, prev_hash: &str) -> AutobookResult<String> {
    let record_json = serde_json::to_vec(record).map_err(|e| AutobookError::StateViolation {
        reason: format!("step record is not serializable: {}", e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Check linkage and recompute every hash. An empty chain is valid.
pub fn verify_chain(entries: &[JournalEntry]) -> bool {
    let mut expected_prev = JournalEntry::GENESIS_HASH.to_string();

    for entry in entries {
        if entry.prev_hash != expected_prev {
            return false;
        }
        match hash_entry(entry.sequence, &entry.record, &entry.prev_hash) {
            Ok(recomputed) if recomputed == entry.this_hash => {}
            _ => return false,
        }
        expected_prev = entry.this_hash.clone();
    }

    true
}
