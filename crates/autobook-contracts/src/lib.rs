//! # autobook-contracts
//!
//! Shared types, schemas, and contracts for the autobook scheduling assistant.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate: it holds data definitions, merge rules and error types.

pub mod action;
pub mod error;
pub mod event;
pub mod execution;
pub mod limits;
pub mod message;
pub mod state;
