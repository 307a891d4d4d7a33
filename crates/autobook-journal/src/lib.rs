//! # autobook-journal
//!
//! Append-only, SHA-256 hash-chained step journal for the autobook runtime.
//!
//! Every step the executor applies is written as a `StepRecord`; the
//! journal wraps each in a `JournalEntry` linked to the previous one by
//! hash. Editing any stored entry breaks the chain and `verify_chain`
//! reports it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use autobook_journal::InMemoryJournal;
//!
//! let journal = InMemoryJournal::new();
//! let executor = Executor::new(oracle, retriever, registry, limits)
//!     .with_journal(Arc::new(journal.clone()));
//! // ... run ...
//! assert!(journal.verify_integrity());
//! let log = journal.export_run(&outcome.run_id.to_string());
//! ```

pub mod chain;
pub mod entry;
pub mod memory;

pub use chain::{hash_entry, verify_chain};
pub use entry::{JournalEntry, RunLog};
pub use memory::InMemoryJournal;

// ── Tests ─────────────────────────────────────────────────────────────────────
