//! User profiles loaded from TOML.
//!
//! One table per user id; every key in the table becomes a profile entry.
//! Non-string values are kept in their TOML rendering.
//!
//! ```toml
//! [default_user]
//! name = "Alex"
//! preferred_doctor = "Dr. Reed"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use autobook_contracts::{
    error::{AutobookError, AutobookResult},
    state::UserProfile,
};
use autobook_core::traits::ProfileStore;

/// An in-memory `ProfileStore`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileBook {
    profiles: BTreeMap<String, UserProfile>,
}

impl ProfileBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `s` as TOML with one table per user.
    pub fn from_toml_str(s: &str) -> AutobookResult<Self> {
        let raw: BTreeMap<String, BTreeMap<String, toml::Value>> =
            toml::from_str(s).map_err(|e| AutobookError::ConfigError {
                reason: format!("failed to parse profile TOML: {}", e),
            })?;

        let profiles = raw
            .into_iter()
            .map(|(user_id, entries)| {
                let profile = entries
                    .into_iter()
                    .map(|(key, value)| {
                        let value = match value {
                            toml::Value::String(s) => s,
                            other => other.to_string(),
                        };
                        (key, value)
                    })
                    .collect();
                (user_id, profile)
            })
            .collect::<BTreeMap<_, _>>();

        debug!(users = profiles.len(), "profiles loaded");
        Ok(Self { profiles })
    }

    pub fn from_file(path: &Path) -> AutobookResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AutobookError::ConfigError {
            reason: format!("failed to read profile file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Add the profile for `user_id`, replacing any existing one.
    pub fn insert(&mut self, user_id: impl Into<String>, profile: UserProfile) {
        self.profiles.insert(user_id.into(), profile);
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl ProfileStore for ProfileBook {
    fn load_profile(&self, user_id: &str) -> UserProfile {
        self.profiles.get(user_id).cloned().unwrap_or_default()
    }
}
