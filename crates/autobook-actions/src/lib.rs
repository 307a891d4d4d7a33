//! # autobook-actions
//!
//! The actions the agent loop can call out of the box:
//! `search_knowledge_base`, `check_calendar_availability` and
//! `create_calendar_invite`.

pub mod builtin;
pub mod calendar;
pub mod handlers;

use std::sync::Arc;

use autobook_contracts::error::AutobookResult;
use autobook_core::{registry::ActionRegistry, traits::Retriever};

pub use builtin::BuiltinAction;
pub use calendar::{CalendarBackend, Invite, SimulatedCalendar};
pub use handlers::BuiltinHandler;

/// A registry holding every built-in action, in `BuiltinAction::ALL` order.
pub fn default_registry(
    retriever: Arc<dyn Retriever>,
    calendar: Arc<dyn CalendarBackend>,
) -> AutobookResult<ActionRegistry> {
    let mut registry = ActionRegistry::new();
    for action in BuiltinAction::ALL {
        let handler = BuiltinHandler::new(action, retriever.clone(), calendar.clone());
        registry.register(action.spec(), Arc::new(handler))?;
    }
    Ok(registry)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
