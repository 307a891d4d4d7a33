//! # autobook-config
//!
//! Startup configuration for the autobook runtime.
//!
//! - [`RuntimeConfig`]: run limits and knowledge-index settings, from TOML
//! - [`ProfileBook`]: user profiles, from TOML, served as a `ProfileStore`
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use autobook_config::{ProfileBook, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_file(Path::new("autobook.toml"))?;
//! let profiles = ProfileBook::from_file(Path::new("profiles.toml"))?;
//! ```

pub mod profiles;
pub mod runtime;

pub use profiles::ProfileBook;
pub use runtime::{KnowledgeConfig, RuntimeConfig};

// ── Tests ─────────────────────────────────────────────────────────────────────
