//! Runtime configuration loaded from TOML.
//!
//! Every key has a default, so an empty document is a valid configuration:
//!
//! ```toml
//! [limits]
//! max_round_trips = 5
//! oracle_timeout_ms = 30000
//! parallel_tools = true
//!
//! [knowledge]
//! chunk_size = 1000
//! chunk_overlap = 200
//! top_k = 4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use autobook_contracts::{
    error::{AutobookError, AutobookResult},
    limits::RunLimits,
};

/// How the knowledge corpus is split and searched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Characters per chunk.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Chunks returned per search.
    pub top_k: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, chunk_overlap: 200, top_k: 4 }
    }
}

/// The whole runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub limits: RunLimits,
    pub knowledge: KnowledgeConfig,
}

impl RuntimeConfig {
    /// Parse and validate `s`.
    ///
    /// Returns `AutobookError::ConfigError` if the TOML is malformed, has
    /// the wrong shape, or fails `validate`.
    pub fn from_toml_str(s: &str) -> AutobookResult<Self> {
        let config: RuntimeConfig = toml::from_str(s).map_err(|e| AutobookError::ConfigError {
            reason: format!("failed to parse runtime TOML: {}", e),
        })?;
        config.validate()?;
        debug!(
            max_round_trips = config.limits.max_round_trips,
            parallel_tools = config.limits.parallel_tools,
            top_k = config.knowledge.top_k,
            "runtime configuration loaded"
        );
        Ok(config)
    }

    /// Read the file at `path` and parse it with `from_toml_str`.
    pub fn from_file(path: &Path) -> AutobookResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AutobookError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> AutobookResult<()> {
        let limits = &self.limits;
        let knowledge = &self.knowledge;
        let checks = [
            (limits.max_round_trips >= 1, "limits.max_round_trips must be at least 1"),
            (limits.max_attempts >= 1, "limits.max_attempts must be at least 1"),
            (limits.stream_capacity >= 1, "limits.stream_capacity must be at least 1"),
            (knowledge.chunk_size >= 1, "knowledge.chunk_size must be at least 1"),
            (
                knowledge.chunk_overlap < knowledge.chunk_size,
                "knowledge.chunk_overlap must be smaller than knowledge.chunk_size",
            ),
            (knowledge.top_k >= 1, "knowledge.top_k must be at least 1"),
        ];
        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, reason)) => Err(AutobookError::ConfigError { reason: reason.to_string() }),
            None => Ok(()),
        }
    }
}
