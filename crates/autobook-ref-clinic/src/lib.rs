//! # autobook-ref-clinic
//!
//! Clinic reference deployment for the autobook scheduling assistant.
//!
//! Bundles a fictional clinic knowledge base, demo user profiles, a
//! simulated calendar and a scripted oracle, and runs six scenarios:
//!
//! 1. **Pipeline Booking**: a detailed request routed straight to scheduling.
//! 2. **Clarification Across Turns**: a vague request answered with a
//!    question, then scheduled on the next turn.
//! 3. **Agent Answers From the Knowledge Base**: one search, one reply.
//! 4. **Agent Books an Appointment**: concurrent availability check and
//!    search, then a calendar invite.
//! 5. **Loop Budget**: an oracle that never stops calling tools.
//! 6. **Streaming**: the booking replayed as server-sent-event frames.
//!
//! All data is fictional. No external API calls are made.

pub mod deployment;
pub mod knowledge;
pub mod oracle;
pub mod scenarios;

pub use deployment::Clinic;
pub use knowledge::KeywordRetriever;
pub use oracle::ScriptedOracle;
