//! Run limits: loop bound, deadlines, retry, and streaming capacity.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounds applied to every run an executor drives.
///
/// Deserialized from the `[limits]` table of the runtime config; every key
/// has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLimits {
    /// Maximum agent→tools→agent cycles per run.
    pub max_round_trips: u32,
    pub oracle_timeout_ms: u64,
    pub retrieval_timeout_ms: u64,
    pub tool_timeout_ms: u64,
    /// Attempts per oracle/retrieval call; 1 disables retry.
    pub max_attempts: u32,
    /// Backoff before attempt n is `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
    /// Run the tool calls of one agent turn concurrently.
    pub parallel_tools: bool,
    /// Capacity of the per-run event channel.
    pub stream_capacity: usize,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_round_trips: 5,
            oracle_timeout_ms: 30_000,
            retrieval_timeout_ms: 10_000,
            tool_timeout_ms: 10_000,
            max_attempts: 1,
            retry_backoff_ms: 250,
            parallel_tools: true,
            stream_capacity: 32,
        }
    }
}

impl RunLimits {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }

    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_millis(self.retrieval_timeout_ms)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_millis(self.tool_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
