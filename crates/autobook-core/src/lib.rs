//! # autobook-core
//!
//! The run loop for the autobook scheduling assistant.
//!
//! This crate provides:
//! - The collaborator traits (`Oracle`, `Retriever`, `ActionHandler`,
//!   `ProfileStore`, `StepJournal`)
//! - The `ActionRegistry` that validates and dispatches oracle-requested actions
//! - The `Executor` that drives the linear pipeline and the agent loop,
//!   with or without a live event stream
//!
//! ## Usage
//!
//! ```rust,ignore
//! use autobook_core::{Executor, registry::ActionRegistry, traits::{Oracle, Retriever}};
//! ```

pub mod agent_loop;
pub mod events;
pub mod executor;
pub mod oracle;
pub mod prompts;
pub mod registry;
pub mod retry;
pub mod router;
pub mod session;
pub mod steps;
pub mod traits;

#[cfg(test)]
mod testing;

pub use executor::Executor;
pub use oracle::{OracleReply, OracleRequest, Purpose, TokenSink};
pub use registry::ActionRegistry;
pub use session::Session;
