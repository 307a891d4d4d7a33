//! The built-in action set.
//!
//! Oracle-chosen names resolve to a `BuiltinAction` before anything runs,
//! so a handler never has to match on raw strings.

use std::fmt;

use serde::{Deserialize, Serialize};

use autobook_contracts::action::{ActionSpec, ArgType, ArgumentSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinAction {
    SearchKnowledgeBase,
    CheckCalendarAvailability,
    CreateCalendarInvite,
}

impl BuiltinAction {
    /// Every built-in action, in the order they are declared to the oracle.
    pub const ALL: [BuiltinAction; 3] = [
        BuiltinAction::SearchKnowledgeBase,
        BuiltinAction::CheckCalendarAvailability,
        BuiltinAction::CreateCalendarInvite,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SearchKnowledgeBase => "search_knowledge_base",
            Self::CheckCalendarAvailability => "check_calendar_availability",
            Self::CreateCalendarInvite => "create_calendar_invite",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// The declaration sent to the oracle and used for argument validation.
    pub fn spec(&self) -> ActionSpec {
        let (description, arguments) = match self {
            Self::SearchKnowledgeBase => (
                "Search the clinic knowledge base for doctors, services, opening hours and policies.",
                vec![ArgumentSpec::required("query", ArgType::String, "What to look up.")],
            ),
            Self::CheckCalendarAvailability => (
                "Check the calendar for available slots on a given date.",
                vec![ArgumentSpec::required(
                    "date",
                    ArgType::String,
                    "The date to check, in YYYY-MM-DD format.",
                )],
            ),
            Self::CreateCalendarInvite => (
                "Create a calendar invite for a specific date and time.",
                vec![
                    ArgumentSpec::required("date", ArgType::String, "The date of the event, in YYYY-MM-DD format."),
                    ArgumentSpec::required("time", ArgType::String, "The time of the event, in HH:MM AM/PM format."),
                    ArgumentSpec::required("title", ArgType::String, "The title of the event."),
                    ArgumentSpec::optional("participants", ArgType::StringList, "Email addresses to invite."),
                ],
            ),
        };
        ActionSpec { name: self.name().to_string(), description: description.to_string(), arguments }
    }
}

impl fmt::Display for BuiltinAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
