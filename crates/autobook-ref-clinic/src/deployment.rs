//! Wiring for the clinic reference deployment.

use std::sync::Arc;

use autobook_actions::{default_registry, SimulatedCalendar};
use autobook_config::{ProfileBook, RuntimeConfig};
use autobook_contracts::error::AutobookResult;
use autobook_core::{traits::Oracle, Executor};
use autobook_journal::InMemoryJournal;

use crate::knowledge::KeywordRetriever;

/// Runtime configuration shipped with the deployment.
pub const CLINIC_CONFIG: &str = include_str!("../autobook.toml");

/// Demo user profiles shipped with the deployment.
pub const CLINIC_PROFILES: &str = include_str!("../profiles/profiles.toml");

/// Everything a clinic run needs except the oracle.
pub struct Clinic {
    pub config: RuntimeConfig,
    pub knowledge: Arc<KeywordRetriever>,
    pub calendar: Arc<SimulatedCalendar>,
    pub profiles: Arc<ProfileBook>,
    pub journal: InMemoryJournal,
}

impl Clinic {
    /// Load the bundled configuration, profiles and knowledge base.
    pub fn load() -> AutobookResult<Self> {
        Self::with_config(RuntimeConfig::from_toml_str(CLINIC_CONFIG)?)
    }

    pub fn with_config(config: RuntimeConfig) -> AutobookResult<Self> {
        config.validate()?;
        let knowledge = Arc::new(KeywordRetriever::clinic(&config.knowledge)?);
        let profiles = Arc::new(ProfileBook::from_toml_str(CLINIC_PROFILES)?);
        Ok(Self {
            config,
            knowledge,
            calendar: Arc::new(SimulatedCalendar::default()),
            profiles,
            journal: InMemoryJournal::new(),
        })
    }

    /// Build an executor with the built-in actions backed by this clinic.
    pub fn executor(&self, oracle: Arc<dyn Oracle>) -> AutobookResult<Arc<Executor>> {
        let registry = default_registry(self.knowledge.clone(), self.calendar.clone())?;
        let executor = Executor::new(oracle, self.knowledge.clone(), Arc::new(registry), self.config.limits.clone())
            .with_profiles(self.profiles.clone())
            .with_journal(Arc::new(self.journal.clone()));
        Ok(Arc::new(executor))
    }
}
